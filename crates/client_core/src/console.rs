//! The admin console: owns the view state and runs every user action against
//! a [`TransportApi`].
//!
//! Each action reads the backend, then swaps the affected view in one step
//! under the state lock. The lock is never held across a request, so actions
//! may overlap; overlapping snapshot refreshes are ordered by a sequence token
//! and only the most recently issued one is applied.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use shared::{
    domain::{DriveId, DriverId, ResidentId},
    protocol::{CreateDriveRequest, CreateDriverRequest, CreateResidentRequest, CreateStopRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    activity_log::{ActivityLog, LogEntry},
    editor::{DialogSurface, EditForm, EditSession, EditState},
    error::ClientError,
    view::{non_blank, EditHandle, FormInputs, InboxView, ScheduleView, SnapshotView},
    TransportApi,
};

const EVENT_BUFFER: usize = 256;

/// How an action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// A local precondition failed; nothing was sent.
    Aborted,
    Failed,
    /// A newer refresh was issued while this one was in flight.
    Superseded,
}

impl Outcome {
    pub fn is_completed(self) -> bool {
        self == Outcome::Completed
    }
}

#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    Logged(LogEntry),
    SnapshotApplied,
    ScheduleLoaded(DriverId),
    InboxLoaded(ResidentId),
    EditorOpened(DriveId),
    EditorClosed,
}

#[derive(Default)]
struct ConsoleState {
    snapshot: SnapshotView,
    schedule: Option<ScheduleView>,
    inbox: Option<InboxView>,
    editor: EditSession,
    log: ActivityLog,
}

pub struct AdminConsole<A: TransportApi> {
    api: A,
    dialog: Arc<dyn DialogSurface>,
    refresh_seq: AtomicU64,
    inner: Mutex<ConsoleState>,
    events: broadcast::Sender<ConsoleEvent>,
}

impl<A: TransportApi> AdminConsole<A> {
    pub fn new(api: A, dialog: Arc<dyn DialogSurface>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            api,
            dialog,
            refresh_seq: AtomicU64::new(0),
            inner: Mutex::new(ConsoleState::default()),
            events,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub async fn snapshot_view(&self) -> SnapshotView {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn schedule_view(&self) -> Option<ScheduleView> {
        self.inner.lock().await.schedule.clone()
    }

    pub async fn inbox_view(&self) -> Option<InboxView> {
        self.inner.lock().await.inbox.clone()
    }

    pub async fn edit_state(&self) -> EditState {
        self.inner.lock().await.editor.state().clone()
    }

    pub async fn log_entries(&self) -> Vec<LogEntry> {
        self.inner.lock().await.log.entries().to_vec()
    }

    pub async fn log(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        self.record(&mut inner, message);
    }

    fn record(&self, state: &mut ConsoleState, message: impl Into<String>) {
        let entry = state.log.append(message);
        info!(message = %entry.message, "console");
        self.emit(ConsoleEvent::Logged(entry));
    }

    fn emit(&self, event: ConsoleEvent) {
        // No subscribers is fine; the event is advisory.
        let _ = self.events.send(event);
    }

    /// Loads the full snapshot and rebuilds every selector and summary table.
    pub async fn refresh_all(&self) -> Outcome {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "refreshing snapshot");
        let result = self.api.list_all().await;

        let mut inner = self.inner.lock().await;
        let latest = self.refresh_seq.load(Ordering::SeqCst);
        if latest != seq {
            debug!(seq, latest, "discarding superseded snapshot response");
            return Outcome::Superseded;
        }

        match result {
            Ok(snapshot) => {
                inner.snapshot = SnapshotView::from_snapshot(&snapshot);
                self.record(&mut inner, "Refreshed options and lists");
                self.emit(ConsoleEvent::SnapshotApplied);
                Outcome::Completed
            }
            Err(err) => {
                warn!(error = %err, "snapshot refresh failed");
                self.record(&mut inner, format!("Failed to refresh data: {err}"));
                Outcome::Failed
            }
        }
    }

    pub async fn create_resident(&self, inputs: &FormInputs) -> Outcome {
        let request = CreateResidentRequest {
            name: non_blank(&inputs.new_resident_name),
            street: inputs.resident_street(),
        };
        info!(street = ?request.street, "creating resident");
        let result = self.api.create_resident(&request).await;
        self.finish_mutation("resident", result).await
    }

    pub async fn create_driver(&self, inputs: &FormInputs) -> Outcome {
        let request = CreateDriverRequest {
            status: non_blank(&inputs.new_driver_status),
        };
        info!("creating driver");
        let result = self.api.create_driver(&request).await;
        self.finish_mutation("driver", result).await
    }

    pub async fn create_drive(&self, inputs: &FormInputs) -> Outcome {
        let Some(driver_id) = inputs.driver_id() else {
            self.log("Select a driver first").await;
            return Outcome::Aborted;
        };
        let request = CreateDriveRequest {
            driver_id,
            when: None,
            location: non_blank(&inputs.new_drive_location),
        };
        info!(%driver_id, "creating drive");
        let result = self.api.create_drive(&request).await;
        self.finish_mutation("drive", result).await
    }

    pub async fn create_stop(&self, inputs: &FormInputs) -> Outcome {
        let (Some(resident_id), Some(drive_id)) = (inputs.resident_id(), inputs.drive_id()) else {
            self.log("Select resident and drive first").await;
            return Outcome::Aborted;
        };
        let request = CreateStopRequest {
            resident_id,
            drive_id,
            street: non_blank(&inputs.new_stop_street),
        };
        info!(%resident_id, %drive_id, "creating stop request");
        let result = self.api.create_stop(&request).await;
        self.finish_mutation("stop", result).await
    }

    async fn finish_mutation<T: Serialize>(
        &self,
        entity: &str,
        result: Result<T, ClientError>,
    ) -> Outcome {
        match result {
            Ok(created) => {
                self.log(format!("Created {entity}: {}", compact_json(&created)))
                    .await;
                self.refresh_all().await;
                Outcome::Completed
            }
            Err(err) => {
                warn!(entity, error = %err, "create request failed");
                self.log(format!("Failed to create {entity}: {}", err.log_detail()))
                    .await;
                Outcome::Failed
            }
        }
    }

    pub async fn show_schedule(&self, inputs: &FormInputs) -> Outcome {
        let Some(driver_id) = inputs.driver_id() else {
            self.log("Select a driver first").await;
            return Outcome::Aborted;
        };
        self.load_schedule(driver_id).await
    }

    async fn load_schedule(&self, driver_id: DriverId) -> Outcome {
        let result = self.api.driver_schedule(driver_id).await;
        let mut inner = self.inner.lock().await;
        match result {
            Ok(drives) => {
                inner.schedule = Some(ScheduleView::from_drives(driver_id, &drives));
                self.record(&mut inner, "Driver schedule loaded");
                self.emit(ConsoleEvent::ScheduleLoaded(driver_id));
                Outcome::Completed
            }
            Err(err) => {
                self.record(
                    &mut inner,
                    format!("Failed to load driver schedule: {}", err.log_detail()),
                );
                Outcome::Failed
            }
        }
    }

    pub async fn show_inbox(&self, inputs: &FormInputs) -> Outcome {
        let Some(resident_id) = inputs.resident_id() else {
            self.log("Select a resident first").await;
            return Outcome::Aborted;
        };
        let street = non_blank(&inputs.new_stop_street);
        let result = self
            .api
            .resident_inbox(resident_id, street.as_deref())
            .await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(requests) => {
                inner.inbox = Some(InboxView::from_requests(resident_id, street, &requests));
                self.record(&mut inner, "Resident inbox loaded");
                self.emit(ConsoleEvent::InboxLoaded(resident_id));
                Outcome::Completed
            }
            Err(err) => {
                self.record(
                    &mut inner,
                    format!("Failed to load resident inbox: {}", err.log_detail()),
                );
                Outcome::Failed
            }
        }
    }

    /// Opens the editor on the drive an edit control captured.
    pub async fn open_editor(&self, handle: &EditHandle) -> Outcome {
        let mut inner = self.inner.lock().await;
        if let Err(err) = inner.editor.open(handle) {
            self.record(&mut inner, err.to_string());
            return Outcome::Aborted;
        }
        self.dialog.open();
        self.emit(ConsoleEvent::EditorOpened(handle.drive_id));
        Outcome::Completed
    }

    /// Same as [`Self::open_editor`], taking the handle from the loaded schedule.
    pub async fn open_editor_for(&self, drive_id: DriveId) -> Outcome {
        let handle = self
            .inner
            .lock()
            .await
            .schedule
            .as_ref()
            .and_then(|schedule| schedule.edit_handle(drive_id).cloned());
        match handle {
            Some(handle) => self.open_editor(&handle).await,
            None => {
                self.log(format!("Drive #{drive_id} is not in the loaded schedule"))
                    .await;
                Outcome::Aborted
            }
        }
    }

    pub async fn edit_form(&self) -> Option<EditForm> {
        self.inner.lock().await.editor.form().cloned()
    }

    pub async fn update_edit_form(&self, apply: impl FnOnce(&mut EditForm)) -> Outcome {
        let mut inner = self.inner.lock().await;
        let applied = inner.editor.form_mut().map(apply);
        match applied {
            Ok(()) => Outcome::Completed,
            Err(err) => {
                self.record(&mut inner, err.to_string());
                Outcome::Aborted
            }
        }
    }

    pub async fn cancel_edit(&self) -> Outcome {
        let mut inner = self.inner.lock().await;
        if let Err(err) = inner.editor.cancel() {
            self.record(&mut inner, err.to_string());
            return Outcome::Aborted;
        }
        self.dialog.close();
        self.emit(ConsoleEvent::EditorClosed);
        Outcome::Completed
    }

    /// Submits the open edit form. On success the dialog closes and the
    /// schedule, then the snapshot, are reloaded; on failure the form stays
    /// open untouched.
    pub async fn submit_edit(&self) -> Outcome {
        let (request, schedule_driver) = {
            let mut inner = self.inner.lock().await;
            match inner.editor.begin_submit() {
                Ok(request) => (
                    request,
                    inner.schedule.as_ref().map(|schedule| schedule.driver_id),
                ),
                Err(err) => {
                    self.record(&mut inner, err.to_string());
                    return Outcome::Aborted;
                }
            }
        };

        info!(drive_id = %request.id, "updating drive");
        let result = self.api.update_drive(&request).await;

        let accepted = result.is_ok();
        {
            let mut inner = self.inner.lock().await;
            match &result {
                Ok(updated) => {
                    self.record(&mut inner, format!("Drive updated: {}", compact_json(updated)))
                }
                Err(err) => self.record(
                    &mut inner,
                    format!("Failed to update drive: {}", err.log_detail()),
                ),
            }
            if let Err(err) = inner.editor.finish_submit(accepted) {
                warn!(error = %err, "drive editor left submitting state early");
            }
        }

        if !accepted {
            return Outcome::Failed;
        }

        self.dialog.close();
        self.emit(ConsoleEvent::EditorClosed);
        if let Some(driver_id) = schedule_driver {
            self.load_schedule(driver_id).await;
        }
        self.refresh_all().await;
        Outcome::Completed
    }
}

fn compact_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
