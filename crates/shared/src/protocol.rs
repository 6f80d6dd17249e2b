use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    Drive, DriveId, Driver, DriverId, Resident, ResidentId, StopRequest, StopRequestId,
};

pub mod endpoints {
    pub const LIST_ALL: &str = "api/transport/list-all";
    pub const CREATE_RESIDENT: &str = "api/transport/create-resident";
    pub const CREATE_DRIVER: &str = "api/transport/create-driver";
    pub const CREATE_DRIVE: &str = "api/transport/create-drive";
    pub const CREATE_STOP: &str = "api/transport/create-stop";
    pub const DRIVER_SCHEDULE: &str = "api/transport/driver-schedule";
    pub const RESIDENT_INBOX: &str = "api/transport/resident-inbox";
    pub const UPDATE_DRIVE: &str = "api/transport/update-drive";
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotSections {
    #[serde(default)]
    drivers: Vec<Driver>,
    #[serde(default)]
    residents: Vec<Resident>,
    #[serde(default)]
    drives: Vec<Drive>,
    #[serde(default)]
    stop_requests: Vec<StopRequest>,
}

/// Full dataset returned by the list-all endpoint.
///
/// The typed sections are what the console works with; `raw` keeps every
/// top-level key of the response, including ones without a schema here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub drivers: Vec<Driver>,
    pub residents: Vec<Resident>,
    pub drives: Vec<Drive>,
    pub stop_requests: Vec<StopRequest>,
    pub raw: Map<String, Value>,
}

impl Snapshot {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(raw) = value else {
            return Err(serde_json::Error::custom("snapshot must be a JSON object"));
        };
        let sections: SnapshotSections = serde_json::from_value(Value::Object(raw.clone()))?;
        Ok(Self {
            drivers: sections.drivers,
            residents: sections.residents,
            drives: sections.drives,
            stop_requests: sections.stop_requests,
            raw,
        })
    }

    pub fn from_json_str(body: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(body)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResidentRequest {
    pub name: Option<String>,
    pub street: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDriverRequest {
    pub status: Option<String>,
}

/// `when` is always sent as null; the backend assigns the schedule time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDriveRequest {
    pub driver_id: DriverId,
    pub when: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStopRequest {
    pub resident_id: ResidentId,
    pub drive_id: DriveId,
    pub street: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDriveRequest {
    pub id: DriveId,
    pub datetime: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverScheduleQuery {
    pub driver_id: DriverId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentInboxQuery {
    pub resident_id: ResidentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResident {
    pub id: ResidentId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDriver {
    pub id: DriverId,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDrive {
    pub id: DriveId,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
}

/// Decoded through [`StopRequest`], so `requestee_id` is accepted the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StopRequest")]
pub struct CreatedStop {
    pub id: StopRequestId,
    pub drive_id: Option<DriveId>,
    pub resident_id: Option<ResidentId>,
    pub street_name: Option<String>,
    pub created_at: Option<String>,
}

impl TryFrom<StopRequest> for CreatedStop {
    type Error = &'static str;

    fn try_from(stop: StopRequest) -> Result<Self, Self::Error> {
        let id = stop.id.ok_or("created stop request has no id")?;
        Ok(Self {
            id,
            drive_id: stop.drive_id,
            resident_id: stop.resident_id,
            street_name: stop.street_name,
            created_at: stop.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedDrive {
    pub id: DriveId,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
}
