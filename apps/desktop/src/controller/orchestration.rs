//! Routes parsed console commands to the [`AdminConsole`].

use client_core::{AdminConsole, FormInputs, TransportApi};
use tracing::debug;

use crate::{
    controller::commands::{ConsoleCommand, CreateTarget, EditField, InputField, SelectTarget, HELP},
    render,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Text to print after any pending log lines.
    Output(String),
    Quiet,
    Quit,
}

pub async fn dispatch_console_command<A: TransportApi>(
    console: &AdminConsole<A>,
    inputs: &mut FormInputs,
    cmd: ConsoleCommand,
) -> Step {
    debug!(command = ?cmd, "dispatching console command");
    match cmd {
        ConsoleCommand::Refresh => {
            console.refresh_all().await;
            Step::Quiet
        }
        ConsoleCommand::Select { target, value } => {
            let slot = match target {
                SelectTarget::Driver => &mut inputs.selected_driver,
                SelectTarget::Resident => &mut inputs.selected_resident,
                SelectTarget::Drive => &mut inputs.selected_drive,
                SelectTarget::Street => &mut inputs.selected_street,
            };
            *slot = value;
            Step::Quiet
        }
        ConsoleCommand::Set { field, value } => {
            let slot = match field {
                InputField::ResidentName => &mut inputs.new_resident_name,
                InputField::ResidentStreet => &mut inputs.new_resident_street,
                InputField::DriverStatus => &mut inputs.new_driver_status,
                InputField::DriveLocation => &mut inputs.new_drive_location,
                InputField::StopStreet => &mut inputs.new_stop_street,
            };
            *slot = value;
            Step::Quiet
        }
        ConsoleCommand::Create(target) => {
            match target {
                CreateTarget::Resident => console.create_resident(inputs).await,
                CreateTarget::Driver => console.create_driver(inputs).await,
                CreateTarget::Drive => console.create_drive(inputs).await,
                CreateTarget::Stop => console.create_stop(inputs).await,
            };
            Step::Quiet
        }
        ConsoleCommand::Schedule => {
            if console.show_schedule(inputs).await.is_completed() {
                if let Some(view) = console.schedule_view().await {
                    return Step::Output(render::schedule(&view));
                }
            }
            Step::Quiet
        }
        ConsoleCommand::Inbox => {
            if console.show_inbox(inputs).await.is_completed() {
                if let Some(view) = console.inbox_view().await {
                    return Step::Output(render::inbox(&view));
                }
            }
            Step::Quiet
        }
        ConsoleCommand::Edit(drive_id) => {
            console.open_editor_for(drive_id).await;
            edit_form_step(console).await
        }
        ConsoleCommand::EditSet { field, value } => {
            console
                .update_edit_form(|form| match field {
                    EditField::Datetime => form.datetime = value,
                    EditField::Location => form.location = value,
                })
                .await;
            edit_form_step(console).await
        }
        ConsoleCommand::EditSubmit => {
            console.submit_edit().await;
            Step::Quiet
        }
        ConsoleCommand::EditCancel => {
            console.cancel_edit().await;
            Step::Quiet
        }
        ConsoleCommand::Show => {
            let mut out = render::snapshot(&console.snapshot_view().await);
            if let Some(view) = console.schedule_view().await {
                out.push_str(&render::schedule(&view));
            }
            if let Some(view) = console.inbox_view().await {
                out.push_str(&render::inbox(&view));
            }
            if console.dialog_open() {
                if let Some(form) = console.edit_form().await {
                    out.push_str(&render::edit_form(&form));
                }
            }
            Step::Output(out)
        }
        ConsoleCommand::Log => Step::Output(render::log(console.log_entries().await.iter())),
        ConsoleCommand::Help => Step::Output(HELP.to_string()),
        ConsoleCommand::Quit => Step::Quit,
    }
}

async fn edit_form_step<A: TransportApi>(console: &AdminConsole<A>) -> Step {
    match console.edit_form().await {
        Some(form) if console.dialog_open() => Step::Output(render::edit_form(&form)),
        _ => Step::Quiet,
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
