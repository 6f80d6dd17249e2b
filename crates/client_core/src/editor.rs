//! Drive edit workflow: `Closed -> Open -> Submitting -> Closed`, falling back
//! to `Open` when the update is refused.

use std::sync::atomic::{AtomicBool, Ordering};

use shared::{domain::DriveId, protocol::UpdateDriveRequest};
use thiserror::Error;

use crate::view::EditHandle;

/// Length of `YYYY-MM-DDTHH:MM`.
const EDITABLE_DATETIME_LEN: usize = 16;

/// The surface hosting the edit form.
pub trait DialogSurface: Send + Sync {
    fn open(&self);
    fn close(&self);
    fn is_open(&self) -> bool;
}

/// Used when no modal implementation is available: just flips visibility.
#[derive(Debug, Default)]
pub struct VisibilityToggle {
    visible: AtomicBool,
}

impl DialogSurface for VisibilityToggle {
    fn open(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct NoopDialog;

impl DialogSurface for NoopDialog {
    fn open(&self) {}

    fn close(&self) {}

    fn is_open(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub id: DriveId,
    pub datetime: String,
    pub location: String,
}

impl EditForm {
    pub fn from_handle(handle: &EditHandle) -> Self {
        Self {
            id: handle.drive_id,
            datetime: truncate_to_minutes(&handle.datetime),
            location: handle.location.clone(),
        }
    }

    fn to_request(&self) -> UpdateDriveRequest {
        UpdateDriveRequest {
            id: self.id,
            datetime: self.datetime.clone(),
            location: self.location.clone(),
        }
    }
}

pub fn truncate_to_minutes(datetime: &str) -> String {
    datetime.chars().take(EDITABLE_DATETIME_LEN).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Closed,
    Open(EditForm),
    Submitting(EditForm),
}

impl EditState {
    fn name(&self) -> &'static str {
        match self {
            EditState::Closed => "closed",
            EditState::Open(_) => "open",
            EditState::Submitting(_) => "submitting",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("cannot {action} while the drive editor is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn form(&self) -> Option<&EditForm> {
        match &self.state {
            EditState::Open(form) | EditState::Submitting(form) => Some(form),
            EditState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, EditState::Open(_))
    }

    /// Loads `handle` into the form. Re-targets an already open editor.
    pub fn open(&mut self, handle: &EditHandle) -> Result<(), EditError> {
        if matches!(self.state, EditState::Submitting(_)) {
            return Err(self.invalid("open the editor"));
        }
        self.state = EditState::Open(EditForm::from_handle(handle));
        Ok(())
    }

    pub fn form_mut(&mut self) -> Result<&mut EditForm, EditError> {
        let state = self.state.name();
        match &mut self.state {
            EditState::Open(form) => Ok(form),
            _ => Err(EditError::InvalidTransition {
                action: "edit fields",
                state,
            }),
        }
    }

    pub fn begin_submit(&mut self) -> Result<UpdateDriveRequest, EditError> {
        let EditState::Open(form) = &self.state else {
            return Err(self.invalid("submit"));
        };
        let form = form.clone();
        let request = form.to_request();
        self.state = EditState::Submitting(form);
        Ok(request)
    }

    /// Leaves `Submitting`: closes on success, reopens with the same fields otherwise.
    pub fn finish_submit(&mut self, accepted: bool) -> Result<(), EditError> {
        let EditState::Submitting(form) = &self.state else {
            return Err(self.invalid("finish a submission"));
        };
        let form = form.clone();
        self.state = if accepted {
            EditState::Closed
        } else {
            EditState::Open(form)
        };
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), EditError> {
        if matches!(self.state, EditState::Submitting(_)) {
            return Err(self.invalid("cancel"));
        }
        self.state = EditState::Closed;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> EditError {
        EditError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> EditHandle {
        EditHandle {
            drive_id: DriveId(7),
            datetime: "2024-01-01T09:30:00Z".to_string(),
            location: "Main St".to_string(),
        }
    }

    #[test]
    fn opening_truncates_datetime_to_minutes() {
        let mut session = EditSession::default();
        session.open(&handle()).expect("open");
        let form = session.form().expect("form");
        assert_eq!(form.id, DriveId(7));
        assert_eq!(form.datetime, "2024-01-01T09:30");
        assert_eq!(form.location, "Main St");
        assert!(session.is_open());
    }

    #[test]
    fn short_datetimes_are_kept_whole() {
        assert_eq!(truncate_to_minutes("2024-01-01"), "2024-01-01");
        assert_eq!(truncate_to_minutes(""), "");
    }

    #[test]
    fn failed_submit_returns_to_open_with_same_fields() {
        let mut session = EditSession::default();
        session.open(&handle()).expect("open");
        session.form_mut().expect("form").location = "Harbour Rd".to_string();

        let request = session.begin_submit().expect("submit");
        assert_eq!(request.location, "Harbour Rd");
        assert!(matches!(session.state(), EditState::Submitting(_)));

        session.finish_submit(false).expect("finish");
        assert!(session.is_open());
        assert_eq!(session.form().expect("form").location, "Harbour Rd");
    }

    #[test]
    fn successful_submit_closes() {
        let mut session = EditSession::default();
        session.open(&handle()).expect("open");
        session.begin_submit().expect("submit");
        session.finish_submit(true).expect("finish");
        assert_eq!(session.state(), &EditState::Closed);
        assert!(session.form().is_none());
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let mut session = EditSession::default();
        assert_eq!(
            session.begin_submit(),
            Err(EditError::InvalidTransition {
                action: "submit",
                state: "closed"
            })
        );
        assert!(session.form_mut().is_err());

        session.open(&handle()).expect("open");
        session.begin_submit().expect("submit");
        assert!(session.open(&handle()).is_err());
        assert!(session.cancel().is_err());
        assert!(session.begin_submit().is_err());
    }

    #[test]
    fn visibility_toggle_tracks_open_state() {
        let dialog = VisibilityToggle::default();
        assert!(!dialog.is_open());
        dialog.open();
        assert!(dialog.is_open());
        dialog.close();
        assert!(!dialog.is_open());
    }

    #[test]
    fn noop_dialog_never_reports_open() {
        let dialog = NoopDialog;
        dialog.open();
        assert!(!dialog.is_open());
    }
}
