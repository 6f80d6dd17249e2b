//! Line commands accepted by the interactive console.

use shared::domain::DriveId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectTarget {
    Driver,
    Resident,
    Drive,
    Street,
}

/// Free-text form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    ResidentName,
    ResidentStreet,
    DriverStatus,
    DriveLocation,
    StopStreet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateTarget {
    Resident,
    Driver,
    Drive,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Datetime,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Refresh,
    Select { target: SelectTarget, value: String },
    Set { field: InputField, value: String },
    Create(CreateTarget),
    Schedule,
    Inbox,
    Edit(DriveId),
    EditSet { field: EditField, value: String },
    EditSubmit,
    EditCancel,
    Show,
    Log,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

pub const HELP: &str = "\
commands:
  refresh                                   reload the full snapshot
  select <driver|resident|drive|street> [v] choose a selector value (blank clears)
  set <name|resident-street|status|location|stop-street> [text]
  create <resident|driver|drive|stop>
  schedule                                  show the selected driver's drives
  inbox                                     show the selected resident's stop requests
  edit <drive id>                           open the editor on a scheduled drive
  edit-set <datetime|location> [text]
  edit-submit | edit-cancel
  show | log | help | quit";

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = split_word(line);
    let command = match head {
        "refresh" => ConsoleCommand::Refresh,
        "select" => {
            let (target, value) = split_word(rest);
            let target = match target {
                "driver" => SelectTarget::Driver,
                "resident" => SelectTarget::Resident,
                "drive" => SelectTarget::Drive,
                "street" => SelectTarget::Street,
                _ => {
                    return Err(CommandParseError::BadArgument {
                        command: "select",
                        expected: "driver, resident, drive or street",
                    })
                }
            };
            ConsoleCommand::Select {
                target,
                value: value.to_string(),
            }
        }
        "set" => {
            let (field, value) = split_word(rest);
            let field = match field {
                "name" => InputField::ResidentName,
                "resident-street" => InputField::ResidentStreet,
                "status" => InputField::DriverStatus,
                "location" => InputField::DriveLocation,
                "stop-street" => InputField::StopStreet,
                _ => {
                    return Err(CommandParseError::BadArgument {
                        command: "set",
                        expected: "name, resident-street, status, location or stop-street",
                    })
                }
            };
            ConsoleCommand::Set {
                field,
                value: value.to_string(),
            }
        }
        "create" => ConsoleCommand::Create(match rest {
            "resident" => CreateTarget::Resident,
            "driver" => CreateTarget::Driver,
            "drive" => CreateTarget::Drive,
            "stop" => CreateTarget::Stop,
            _ => {
                return Err(CommandParseError::BadArgument {
                    command: "create",
                    expected: "resident, driver, drive or stop",
                })
            }
        }),
        "schedule" => ConsoleCommand::Schedule,
        "inbox" => ConsoleCommand::Inbox,
        "edit" => match rest.parse::<i64>() {
            Ok(id) if id > 0 => ConsoleCommand::Edit(DriveId(id)),
            _ => {
                return Err(CommandParseError::BadArgument {
                    command: "edit",
                    expected: "a drive id",
                })
            }
        },
        "edit-set" => {
            let (field, value) = split_word(rest);
            let field = match field {
                "datetime" => EditField::Datetime,
                "location" => EditField::Location,
                _ => {
                    return Err(CommandParseError::BadArgument {
                        command: "edit-set",
                        expected: "datetime or location",
                    })
                }
            };
            ConsoleCommand::EditSet {
                field,
                value: value.to_string(),
            }
        }
        "edit-submit" => ConsoleCommand::EditSubmit,
        "edit-cancel" => ConsoleCommand::EditCancel,
        "show" => ConsoleCommand::Show,
        "log" => ConsoleCommand::Log,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}
