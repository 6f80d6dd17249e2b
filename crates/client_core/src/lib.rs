use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Drive, DriverId, ResidentId, StopRequest},
    protocol::{
        endpoints, CreateDriveRequest, CreateDriverRequest, CreateResidentRequest,
        CreateStopRequest, CreatedDrive, CreatedDriver, CreatedResident, CreatedStop,
        DriverScheduleQuery, ResidentInboxQuery, Snapshot, UpdateDriveRequest, UpdatedDrive,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod activity_log;
pub mod console;
pub mod editor;
pub mod error;
pub mod view;

pub use activity_log::{ActivityLog, LogEntry};
pub use console::{AdminConsole, ConsoleEvent, Outcome};
pub use editor::{
    DialogSurface, EditError, EditForm, EditSession, EditState, NoopDialog, VisibilityToggle,
};
pub use error::ClientError;
pub use view::{FormInputs, InboxView, ScheduleView, SnapshotView};

/// Backend operations the console depends on.
#[async_trait]
pub trait TransportApi: Send + Sync {
    async fn list_all(&self) -> Result<Snapshot, ClientError>;
    async fn create_resident(
        &self,
        request: &CreateResidentRequest,
    ) -> Result<CreatedResident, ClientError>;
    async fn create_driver(
        &self,
        request: &CreateDriverRequest,
    ) -> Result<CreatedDriver, ClientError>;
    async fn create_drive(&self, request: &CreateDriveRequest)
        -> Result<CreatedDrive, ClientError>;
    async fn create_stop(&self, request: &CreateStopRequest) -> Result<CreatedStop, ClientError>;
    async fn driver_schedule(&self, driver_id: DriverId) -> Result<Vec<Drive>, ClientError>;
    async fn resident_inbox(
        &self,
        resident_id: ResidentId,
        street: Option<&str>,
    ) -> Result<Vec<StopRequest>, ClientError>;
    async fn update_drive(&self, request: &UpdateDriveRequest)
        -> Result<UpdatedDrive, ClientError>;
}

/// reqwest-backed client for the `/api/transport` endpoints.
///
/// No timeout is configured: a hung request only stalls the action awaiting it.
#[derive(Clone)]
pub struct HttpTransportClient {
    http: Client,
    base_url: Url,
}

impl HttpTransportClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let trimmed = server_url.trim();
        let mut base_url = Url::parse(trimmed)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<Q, T>(&self, path: &str, query: Option<&Q>) -> Result<T, ClientError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        read_json(path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self.http.post(url).json(body).send().await?;
        read_json(path, response).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        warn!(path, status = status.as_u16(), "transport request rejected");
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    debug!(path, status = status.as_u16(), bytes = body.len(), "transport response");
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl TransportApi for HttpTransportClient {
    async fn list_all(&self) -> Result<Snapshot, ClientError> {
        let raw: serde_json::Value = self.get_json::<(), _>(endpoints::LIST_ALL, None).await?;
        Ok(Snapshot::from_value(raw)?)
    }

    async fn create_resident(
        &self,
        request: &CreateResidentRequest,
    ) -> Result<CreatedResident, ClientError> {
        self.post_json(endpoints::CREATE_RESIDENT, request).await
    }

    async fn create_driver(
        &self,
        request: &CreateDriverRequest,
    ) -> Result<CreatedDriver, ClientError> {
        self.post_json(endpoints::CREATE_DRIVER, request).await
    }

    async fn create_drive(
        &self,
        request: &CreateDriveRequest,
    ) -> Result<CreatedDrive, ClientError> {
        self.post_json(endpoints::CREATE_DRIVE, request).await
    }

    async fn create_stop(&self, request: &CreateStopRequest) -> Result<CreatedStop, ClientError> {
        self.post_json(endpoints::CREATE_STOP, request).await
    }

    async fn driver_schedule(&self, driver_id: DriverId) -> Result<Vec<Drive>, ClientError> {
        self.get_json(
            endpoints::DRIVER_SCHEDULE,
            Some(&DriverScheduleQuery { driver_id }),
        )
        .await
    }

    async fn resident_inbox(
        &self,
        resident_id: ResidentId,
        street: Option<&str>,
    ) -> Result<Vec<StopRequest>, ClientError> {
        let query = ResidentInboxQuery {
            resident_id,
            street: street.map(str::to_string),
        };
        self.get_json(endpoints::RESIDENT_INBOX, Some(&query)).await
    }

    async fn update_drive(
        &self,
        request: &UpdateDriveRequest,
    ) -> Result<UpdatedDrive, ClientError> {
        self.post_json(endpoints::UPDATE_DRIVE, request).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
