//! Per-widget view state derived from backend data.
//!
//! Every view here is rebuilt from scratch by its `from_*` constructor and then
//! swapped in whole; nothing is patched in place.

use std::{collections::HashSet, fmt::Display};

use serde_json::Value;
use shared::{
    domain::{Drive, DriveId, DriverId, ResidentId, StopRequest},
    protocol::Snapshot,
};

pub const DRIVER_PLACEHOLDER: &str = "Choose driver";
pub const RESIDENT_PLACEHOLDER: &str = "Choose resident";
pub const DRIVE_PLACEHOLDER: &str = "Choose drive";
pub const STREET_PLACEHOLDER: &str = "Choose street";

/// Raw widget values as a frontend holds them. Empty strings mean "blank".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub selected_driver: String,
    pub selected_resident: String,
    pub selected_drive: String,
    pub selected_street: String,
    pub new_resident_name: String,
    pub new_resident_street: String,
    pub new_driver_status: String,
    pub new_drive_location: String,
    /// Street for new stops; doubles as the inbox filter.
    pub new_stop_street: String,
}

impl FormInputs {
    pub fn driver_id(&self) -> Option<DriverId> {
        parse_selected_id(&self.selected_driver).map(DriverId)
    }

    pub fn resident_id(&self) -> Option<ResidentId> {
        parse_selected_id(&self.selected_resident).map(ResidentId)
    }

    pub fn drive_id(&self) -> Option<DriveId> {
        parse_selected_id(&self.selected_drive).map(DriveId)
    }

    /// Typed street entry wins over the street selector.
    pub fn resident_street(&self) -> Option<String> {
        non_blank(&self.new_resident_street).or_else(|| non_blank(&self.selected_street))
    }
}

/// A selector value counts only when it is a positive integer.
pub fn parse_selected_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Missing ids render as an empty cell.
pub fn id_text(id: Option<impl Display>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

pub fn non_blank(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub placeholder: &'static str,
    pub options: Vec<SelectOption>,
}

impl Selector {
    fn new(placeholder: &'static str) -> Self {
        Self {
            placeholder,
            options: Vec::new(),
        }
    }

    fn push(&mut self, value: impl Into<String>, label: impl Into<String>) {
        self.options.push(SelectOption {
            value: value.into(),
            label: label.into(),
        });
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveRow {
    pub id: String,
    pub datetime: String,
    pub driver_id: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub key: String,
    pub pretty_json: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotView {
    pub drivers: Selector,
    pub residents: Selector,
    pub drives: Selector,
    pub streets: Selector,
    pub drive_rows: Vec<DriveRow>,
    pub all_data: Vec<DataRow>,
}

impl Default for SnapshotView {
    fn default() -> Self {
        Self {
            drivers: Selector::new(DRIVER_PLACEHOLDER),
            residents: Selector::new(RESIDENT_PLACEHOLDER),
            drives: Selector::new(DRIVE_PLACEHOLDER),
            streets: Selector::new(STREET_PLACEHOLDER),
            drive_rows: Vec::new(),
            all_data: Vec::new(),
        }
    }
}

impl SnapshotView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut view = Self::default();

        for driver in &snapshot.drivers {
            let id = id_text(driver.id);
            view.drivers.push(
                id.clone(),
                format!("#{id} - {}", driver.status.as_deref().unwrap_or("")),
            );
        }

        for resident in &snapshot.residents {
            let street = match resident.street.as_deref() {
                Some(street) if !street.is_empty() => format!(" ({street})"),
                _ => String::new(),
            };
            let id = id_text(resident.id);
            view.residents.push(
                id.clone(),
                format!("#{id} - {}{street}", resident.name.as_deref().unwrap_or("")),
            );
        }

        for drive in &snapshot.drives {
            let id = id_text(drive.id);
            let datetime = drive.datetime.clone().unwrap_or_default();
            view.drives.push(id.clone(), format!("#{id} - {datetime}"));
            view.drive_rows.push(DriveRow {
                id,
                datetime,
                driver_id: id_text(drive.driver_id),
                location: drive.current_location.clone().unwrap_or_default(),
            });
        }

        for street in derive_street_set(snapshot) {
            view.streets.push(street.clone(), street);
        }

        view.all_data = snapshot
            .raw
            .iter()
            .map(|(key, value)| DataRow {
                key: key.clone(),
                pretty_json: pretty_json(value),
            })
            .collect();

        view
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Distinct non-empty streets from residents, then stop requests, in
/// first-seen order.
pub fn derive_street_set(snapshot: &Snapshot) -> Vec<String> {
    let resident_streets = snapshot.residents.iter().map(|r| r.street.as_deref());
    let stop_streets = snapshot
        .stop_requests
        .iter()
        .map(|s| s.street_name.as_deref());

    let mut seen = HashSet::new();
    let mut streets = Vec::new();
    for street in resident_streets.chain(stop_streets).flatten() {
        if !street.is_empty() && seen.insert(street) {
            streets.push(street.to_string());
        }
    }
    streets
}

/// Data an edit control carries into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHandle {
    pub drive_id: DriveId,
    pub datetime: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub id: String,
    pub datetime: String,
    pub stops: String,
    pub location: String,
    /// `None` when the backend sent the drive without an id.
    pub edit: Option<EditHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    pub driver_id: DriverId,
    pub rows: Vec<ScheduleRow>,
}

impl ScheduleView {
    pub fn from_drives(driver_id: DriverId, drives: &[Drive]) -> Self {
        let rows = drives
            .iter()
            .map(|drive| {
                let datetime = drive.datetime.clone().unwrap_or_default();
                let location = drive.current_location.clone().unwrap_or_default();
                ScheduleRow {
                    id: id_text(drive.id),
                    datetime: datetime.clone(),
                    stops: drive
                        .stops
                        .iter()
                        .map(|stop| stop.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    location: location.clone(),
                    edit: drive.id.map(|drive_id| EditHandle {
                        drive_id,
                        datetime,
                        location,
                    }),
                }
            })
            .collect();
        Self { driver_id, rows }
    }

    pub fn edit_handle(&self, drive_id: DriveId) -> Option<&EditHandle> {
        self.rows
            .iter()
            .filter_map(|row| row.edit.as_ref())
            .find(|handle| handle.drive_id == drive_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxRow {
    pub id: String,
    pub street: String,
    pub drive_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxView {
    pub resident_id: ResidentId,
    pub street_filter: Option<String>,
    pub rows: Vec<InboxRow>,
}

impl InboxView {
    pub fn from_requests(
        resident_id: ResidentId,
        street_filter: Option<String>,
        requests: &[StopRequest],
    ) -> Self {
        let rows = requests
            .iter()
            .map(|request| InboxRow {
                id: id_text(request.id),
                street: request.street_name.clone().unwrap_or_default(),
                drive_id: id_text(request.drive_id),
                created_at: request.created_at.clone().unwrap_or_default(),
            })
            .collect();
        Self {
            resident_id,
            street_filter,
            rows,
        }
    }
}
