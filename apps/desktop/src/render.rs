//! Plain-text rendering of the console views.

use std::fmt::Write as _;

use client_core::{
    view::{Selector, SnapshotView},
    EditForm, InboxView, LogEntry, ScheduleView,
};

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    write_row(&mut out, headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in rows {
        write_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    out
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}", width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

fn selector(title: &str, selector: &Selector) -> String {
    let mut out = format!("=== {title} ===\n{}\n", selector.placeholder);
    for option in &selector.options {
        let _ = writeln!(out, "  [{}] {}", option.value, option.label);
    }
    out
}

pub fn snapshot(view: &SnapshotView) -> String {
    let mut out = String::new();
    out.push_str(&selector("DRIVERS", &view.drivers));
    out.push_str(&selector("RESIDENTS", &view.residents));
    out.push_str(&selector("DRIVES", &view.drives));
    out.push_str(&selector("STREETS", &view.streets));

    out.push_str("=== DRIVE TABLE ===\n");
    let rows: Vec<Vec<String>> = view
        .drive_rows
        .iter()
        .map(|row| {
            vec![
                row.id.clone(),
                row.datetime.clone(),
                row.driver_id.clone(),
                row.location.clone(),
            ]
        })
        .collect();
    out.push_str(&table(&["id", "datetime", "driver", "location"], &rows));

    out.push_str("=== ALL DATA ===\n");
    for row in &view.all_data {
        let _ = writeln!(out, "{}:\n{}", row.key, row.pretty_json);
    }
    out
}

pub fn schedule(view: &ScheduleView) -> String {
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            vec![
                row.id.clone(),
                row.datetime.clone(),
                row.stops.clone(),
                row.location.clone(),
                row.edit
                    .as_ref()
                    .map(|handle| format!("edit {}", handle.drive_id))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    format!(
        "=== SCHEDULE FOR DRIVER #{} ===\n{}",
        view.driver_id,
        table(&["id", "datetime", "stops", "location", ""], &rows)
    )
}

pub fn inbox(view: &InboxView) -> String {
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            vec![
                row.id.clone(),
                row.street.clone(),
                row.drive_id.clone(),
                row.created_at.clone(),
            ]
        })
        .collect();
    let filter = view
        .street_filter
        .as_deref()
        .map(|street| format!(" (street: {street})"))
        .unwrap_or_default();
    format!(
        "=== INBOX FOR RESIDENT #{}{filter} ===\n{}",
        view.resident_id,
        table(&["id", "street", "drive", "created"], &rows)
    )
}

pub fn edit_form(form: &EditForm) -> String {
    format!(
        "=== EDIT DRIVE #{} ===\ndatetime: {}\nlocation: {}\n",
        form.id, form.datetime, form.location
    )
}

/// Newest entry first.
pub fn log<'a>(entries: impl DoubleEndedIterator<Item = &'a LogEntry>) -> String {
    let mut out = String::new();
    for entry in entries.rev() {
        let _ = writeln!(out, "{entry}");
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
