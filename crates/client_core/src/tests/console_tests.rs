use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex as StdMutex,
};

use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::{Drive, StopRequest, StopRequestId},
    protocol::{
        CreatedDrive, CreatedDriver, CreatedResident, CreatedStop, Snapshot, UpdateDriveRequest,
        UpdatedDrive,
    },
};
use tokio::sync::oneshot;

use super::*;
use crate::editor::VisibilityToggle;

enum Scripted {
    Ready(Snapshot),
    Fail(&'static str),
    Gated {
        entered: oneshot::Sender<()>,
        release: oneshot::Receiver<()>,
        snapshot: Snapshot,
    },
}

#[derive(Default)]
struct FakeApi {
    calls: StdMutex<Vec<&'static str>>,
    snapshots: StdMutex<VecDeque<Scripted>>,
    reject_writes: Option<&'static str>,
    schedule: Vec<Drive>,
    resident_requests: StdMutex<Vec<CreateResidentRequest>>,
    drive_requests: StdMutex<Vec<CreateDriveRequest>>,
    inbox_queries: StdMutex<Vec<(ResidentId, Option<String>)>>,
    updates: StdMutex<Vec<UpdateDriveRequest>>,
}

impl FakeApi {
    fn with_snapshots(snapshots: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            snapshots: StdMutex::new(snapshots.into_iter().collect()),
            ..Self::default()
        }
    }

    fn rejecting(mut self, body: &'static str) -> Self {
        self.reject_writes = Some(body);
        self
    }

    fn with_schedule(mut self, schedule: Vec<Drive>) -> Self {
        self.schedule = schedule;
        self
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls").push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls").clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|name| **name == call).count()
    }

    fn write_result<T>(&self, ok: T) -> Result<T, ClientError> {
        match self.reject_writes {
            Some(body) => Err(ClientError::Rejected {
                status: 400,
                body: body.to_string(),
            }),
            None => Ok(ok),
        }
    }
}

#[async_trait]
impl TransportApi for FakeApi {
    async fn list_all(&self) -> Result<Snapshot, ClientError> {
        self.record("list_all");
        let next = self.snapshots.lock().expect("snapshots").pop_front();
        match next {
            Some(Scripted::Ready(snapshot)) => Ok(snapshot),
            Some(Scripted::Fail(body)) => Err(ClientError::Rejected {
                status: 500,
                body: body.to_string(),
            }),
            Some(Scripted::Gated {
                entered,
                release,
                snapshot,
            }) => {
                let _ = entered.send(());
                let _ = release.await;
                Ok(snapshot)
            }
            None => Ok(Snapshot::default()),
        }
    }

    async fn create_resident(
        &self,
        request: &CreateResidentRequest,
    ) -> Result<CreatedResident, ClientError> {
        self.record("create_resident");
        self.resident_requests
            .lock()
            .expect("resident requests")
            .push(request.clone());
        self.write_result(CreatedResident {
            id: ResidentId(30),
            name: request.name.clone(),
        })
    }

    async fn create_driver(
        &self,
        request: &CreateDriverRequest,
    ) -> Result<CreatedDriver, ClientError> {
        self.record("create_driver");
        self.write_result(CreatedDriver {
            id: DriverId(20),
            status: request.status.clone(),
        })
    }

    async fn create_drive(
        &self,
        request: &CreateDriveRequest,
    ) -> Result<CreatedDrive, ClientError> {
        self.record("create_drive");
        self.drive_requests
            .lock()
            .expect("drive requests")
            .push(request.clone());
        self.write_result(CreatedDrive {
            id: DriveId(40),
            driver_id: Some(request.driver_id),
            datetime: Some("2024-01-01 10:00:00".to_string()),
            current_location: request.location.clone(),
        })
    }

    async fn create_stop(&self, request: &CreateStopRequest) -> Result<CreatedStop, ClientError> {
        self.record("create_stop");
        self.write_result(CreatedStop {
            id: StopRequestId(50),
            drive_id: Some(request.drive_id),
            resident_id: Some(request.resident_id),
            street_name: request.street.clone(),
            created_at: None,
        })
    }

    async fn driver_schedule(&self, _driver_id: DriverId) -> Result<Vec<Drive>, ClientError> {
        self.record("driver_schedule");
        Ok(self.schedule.clone())
    }

    async fn resident_inbox(
        &self,
        resident_id: ResidentId,
        street: Option<&str>,
    ) -> Result<Vec<StopRequest>, ClientError> {
        self.record("resident_inbox");
        self.inbox_queries
            .lock()
            .expect("inbox queries")
            .push((resident_id, street.map(str::to_string)));
        Ok(vec![StopRequest {
            id: Some(StopRequestId(5)),
            street_name: Some("Oak".to_string()),
            drive_id: Some(DriveId(7)),
            resident_id: Some(resident_id),
            created_at: Some("2024-01-01T08:00:00".to_string()),
        }])
    }

    async fn update_drive(
        &self,
        request: &UpdateDriveRequest,
    ) -> Result<UpdatedDrive, ClientError> {
        self.record("update_drive");
        self.updates.lock().expect("updates").push(request.clone());
        self.write_result(UpdatedDrive {
            id: request.id,
            datetime: Some(format!("{}:00", request.datetime)),
            current_location: Some(request.location.clone()),
        })
    }
}

fn snapshot(value: serde_json::Value) -> Snapshot {
    Snapshot::from_value(value).expect("snapshot")
}

fn console(api: FakeApi) -> (AdminConsole<FakeApi>, Arc<VisibilityToggle>) {
    let dialog = Arc::new(VisibilityToggle::default());
    (AdminConsole::new(api, dialog.clone()), dialog)
}

fn scheduled_drive() -> Drive {
    Drive {
        id: Some(DriveId(7)),
        datetime: Some("2024-01-01T09:30:00Z".to_string()),
        driver_id: Some(DriverId(2)),
        current_location: Some("Main St".to_string()),
        stops: vec![StopRequestId(5)],
    }
}

fn inputs_with_driver(driver: &str) -> FormInputs {
    FormInputs {
        selected_driver: driver.to_string(),
        ..FormInputs::default()
    }
}

async fn last_log(console: &AdminConsole<FakeApi>) -> String {
    console
        .log_entries()
        .await
        .last()
        .map(|entry| entry.message.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn refresh_builds_street_selector_from_residents_and_stops() {
    let (console, _) = console(FakeApi::with_snapshots([Scripted::Ready(snapshot(json!({
        "residents": [{"id": 1, "street": "Elm"}],
        "stop_requests": [{"street_name": "Oak"}]
    })))]));

    assert_eq!(console.refresh_all().await, Outcome::Completed);

    let view = console.snapshot_view().await;
    let streets: HashSet<&str> = view.streets.values().collect();
    assert_eq!(streets, HashSet::from(["Elm", "Oak"]));
    assert_eq!(view.streets.options.len(), 2);
    assert_eq!(last_log(&console).await, "Refreshed options and lists");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_view() {
    let (console, _) = console(FakeApi::with_snapshots([
        Scripted::Ready(snapshot(json!({"drivers": [{"id": 2, "status": "ready"}]}))),
        Scripted::Fail("upstream unavailable"),
    ]));

    console.refresh_all().await;
    assert_eq!(console.refresh_all().await, Outcome::Failed);

    let view = console.snapshot_view().await;
    assert_eq!(view.drivers.options.len(), 1);
    assert!(last_log(&console)
        .await
        .starts_with("Failed to refresh data:"));
}

#[tokio::test]
async fn superseded_refresh_response_is_discarded() {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    let (console, _) = console(FakeApi::with_snapshots([
        Scripted::Gated {
            entered: entered_tx,
            release: release_rx,
            snapshot: snapshot(json!({"drivers": [{"id": 1, "status": "stale"}]})),
        },
        Scripted::Ready(snapshot(json!({"drivers": [{"id": 2, "status": "fresh"}]}))),
    ]));

    let older = console.refresh_all();
    let newer = async {
        entered_rx.await.expect("first refresh in flight");
        let outcome = console.refresh_all().await;
        release_tx.send(()).expect("release first refresh");
        outcome
    };
    let (older, newer) = tokio::join!(older, newer);

    assert_eq!(older, Outcome::Superseded);
    assert_eq!(newer, Outcome::Completed);
    let view = console.snapshot_view().await;
    assert_eq!(view.drivers.options[0].label, "#2 - fresh");
}

#[tokio::test]
async fn create_drive_without_driver_sends_nothing() {
    let (console, _) = console(FakeApi::default());

    for selected in ["", "0", "driver"] {
        let outcome = console.create_drive(&inputs_with_driver(selected)).await;
        assert_eq!(outcome, Outcome::Aborted);
    }

    assert!(console.api().calls().is_empty());
    assert_eq!(last_log(&console).await, "Select a driver first");
}

#[tokio::test]
async fn create_stop_requires_resident_and_drive() {
    let (console, _) = console(FakeApi::default());

    let resident_only = FormInputs {
        selected_resident: "3".to_string(),
        ..FormInputs::default()
    };
    let drive_only = FormInputs {
        selected_drive: "7".to_string(),
        ..FormInputs::default()
    };
    assert_eq!(console.create_stop(&resident_only).await, Outcome::Aborted);
    assert_eq!(console.create_stop(&drive_only).await, Outcome::Aborted);

    assert!(console.api().calls().is_empty());
    assert_eq!(last_log(&console).await, "Select resident and drive first");
}

#[tokio::test]
async fn successful_mutations_reload_snapshot_exactly_once() {
    let (console, _) = console(FakeApi::default());
    let inputs = FormInputs {
        selected_driver: "2".to_string(),
        selected_resident: "3".to_string(),
        selected_drive: "7".to_string(),
        new_driver_status: "available".to_string(),
        ..FormInputs::default()
    };

    assert_eq!(console.create_resident(&inputs).await, Outcome::Completed);
    assert_eq!(console.create_driver(&inputs).await, Outcome::Completed);
    assert_eq!(console.create_drive(&inputs).await, Outcome::Completed);
    assert_eq!(console.create_stop(&inputs).await, Outcome::Completed);

    assert_eq!(
        console.api().calls(),
        vec![
            "create_resident",
            "list_all",
            "create_driver",
            "list_all",
            "create_drive",
            "list_all",
            "create_stop",
            "list_all",
        ]
    );
}

#[tokio::test]
async fn rejected_mutation_logs_body_without_refresh() {
    let (console, _) = console(FakeApi::default().rejecting(r#"{"error": "Driver not found or error"}"#));

    let outcome = console.create_drive(&inputs_with_driver("9")).await;

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(console.api().count("list_all"), 0);
    assert_eq!(
        last_log(&console).await,
        "Failed to create drive: Driver not found or error"
    );
}

#[tokio::test]
async fn create_requests_map_blank_inputs_to_null() {
    let (console, _) = console(FakeApi::default());
    let inputs = FormInputs {
        selected_driver: "2".to_string(),
        selected_street: "Elm".to_string(),
        new_resident_street: "Birch".to_string(),
        ..FormInputs::default()
    };

    console.create_resident(&inputs).await;
    console.create_drive(&inputs).await;

    let resident = console.api().resident_requests.lock().expect("lock")[0].clone();
    assert_eq!(resident.name, None);
    assert_eq!(resident.street.as_deref(), Some("Birch"));

    let drive = console.api().drive_requests.lock().expect("lock")[0].clone();
    assert_eq!(drive.driver_id, DriverId(2));
    assert_eq!(drive.when, None);
    assert_eq!(drive.location, None);
    assert!(last_log(&console).await.starts_with("Refreshed"));
}

#[tokio::test]
async fn inbox_passes_optional_street_filter() {
    let (console, _) = console(FakeApi::default());

    assert_eq!(console.show_inbox(&FormInputs::default()).await, Outcome::Aborted);
    assert_eq!(last_log(&console).await, "Select a resident first");

    let mut inputs = FormInputs {
        selected_resident: "3".to_string(),
        ..FormInputs::default()
    };
    console.show_inbox(&inputs).await;
    inputs.new_stop_street = "Oak Lane".to_string();
    console.show_inbox(&inputs).await;

    let queries = console.api().inbox_queries.lock().expect("lock").clone();
    assert_eq!(
        queries,
        vec![
            (ResidentId(3), None),
            (ResidentId(3), Some("Oak Lane".to_string()))
        ]
    );
    let inbox = console.inbox_view().await.expect("inbox");
    assert_eq!(inbox.rows[0].street, "Oak");
    assert_eq!(inbox.rows[0].drive_id, "7");
    assert_eq!(inbox.street_filter.as_deref(), Some("Oak Lane"));
}

#[tokio::test]
async fn schedule_requires_selected_driver() {
    let (console, _) = console(FakeApi::default());
    assert_eq!(
        console.show_schedule(&FormInputs::default()).await,
        Outcome::Aborted
    );
    assert!(console.api().calls().is_empty());
}

#[tokio::test]
async fn editor_opens_with_minute_precision_fields() {
    let (console, dialog) = console(FakeApi::default().with_schedule(vec![scheduled_drive()]));

    console.show_schedule(&inputs_with_driver("2")).await;
    let schedule = console.schedule_view().await.expect("schedule");
    assert_eq!(schedule.rows[0].stops, "5");

    assert_eq!(console.open_editor_for(DriveId(7)).await, Outcome::Completed);

    let form = console.edit_form().await.expect("form");
    assert_eq!(form.id, DriveId(7));
    assert_eq!(form.datetime, "2024-01-01T09:30");
    assert_eq!(form.location, "Main St");
    assert!(dialog.is_open());
}

#[tokio::test]
async fn successful_update_closes_dialog_and_reloads_schedule_then_snapshot() {
    let (console, dialog) = console(FakeApi::default().with_schedule(vec![scheduled_drive()]));
    console.show_schedule(&inputs_with_driver("2")).await;
    console.open_editor_for(DriveId(7)).await;
    console
        .update_edit_form(|form| form.location = "Harbour Rd".to_string())
        .await;

    assert_eq!(console.submit_edit().await, Outcome::Completed);

    assert!(!dialog.is_open());
    assert_eq!(console.edit_state().await, EditState::Closed);
    assert_eq!(
        console.api().calls(),
        vec!["driver_schedule", "update_drive", "driver_schedule", "list_all"]
    );
    let update = console.api().updates.lock().expect("lock")[0].clone();
    assert_eq!(update.id, DriveId(7));
    assert_eq!(update.datetime, "2024-01-01T09:30");
    assert_eq!(update.location, "Harbour Rd");
}

#[tokio::test]
async fn failed_update_keeps_dialog_open_without_reloads() {
    let (console, dialog) = console(
        FakeApi::default()
            .with_schedule(vec![scheduled_drive()])
            .rejecting(r#"{"error": "Invalid datetime format"}"#),
    );
    console.show_schedule(&inputs_with_driver("2")).await;
    console.open_editor_for(DriveId(7)).await;
    console
        .update_edit_form(|form| form.datetime = "tomorrow".to_string())
        .await;

    assert_eq!(console.submit_edit().await, Outcome::Failed);

    assert!(dialog.is_open());
    let form = console.edit_form().await.expect("form stays");
    assert_eq!(form.datetime, "tomorrow");
    assert!(matches!(console.edit_state().await, EditState::Open(_)));
    assert_eq!(console.api().count("driver_schedule"), 1);
    assert_eq!(console.api().count("list_all"), 0);
    assert_eq!(
        last_log(&console).await,
        "Failed to update drive: Invalid datetime format"
    );
}

#[tokio::test]
async fn cancel_closes_dialog_and_submit_then_aborts() {
    let (console, dialog) = console(FakeApi::default().with_schedule(vec![scheduled_drive()]));
    console.show_schedule(&inputs_with_driver("2")).await;
    console.open_editor_for(DriveId(7)).await;

    assert_eq!(console.cancel_edit().await, Outcome::Completed);
    assert!(!dialog.is_open());

    assert_eq!(console.submit_edit().await, Outcome::Aborted);
    assert_eq!(console.api().count("update_drive"), 0);
}

#[tokio::test]
async fn open_editor_for_unknown_drive_aborts() {
    let (console, dialog) = console(FakeApi::default().with_schedule(vec![scheduled_drive()]));
    console.show_schedule(&inputs_with_driver("2")).await;

    assert_eq!(console.open_editor_for(DriveId(99)).await, Outcome::Aborted);
    assert!(!dialog.is_open());
}

#[tokio::test]
async fn log_entries_are_broadcast() {
    let (console, _) = console(FakeApi::default());
    let mut events = console.subscribe_events();

    console.create_drive(&FormInputs::default()).await;

    match events.recv().await.expect("event") {
        ConsoleEvent::Logged(entry) => assert_eq!(entry.message, "Select a driver first"),
        other => panic!("unexpected event: {other:?}"),
    }
}
