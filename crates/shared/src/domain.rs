use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DriverId);
id_newtype!(ResidentId);
id_newtype!(DriveId);
id_newtype!(StopRequestId);

// Every record field is optional, ids included. A row missing one still loads.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default)]
    pub id: Option<DriverId>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    #[serde(default)]
    pub id: Option<ResidentId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
}

/// A scheduled transport run. `datetime` is kept exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    #[serde(default)]
    pub id: Option<DriveId>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub current_location: Option<String>,
    #[serde(default)]
    pub stops: Vec<StopRequestId>,
}

/// A resident's request to be picked up on a drive.
///
/// Older backends name the resident `requestee_id`. When a row carries both
/// keys, `resident_id` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StopRequestRow")]
pub struct StopRequest {
    pub id: Option<StopRequestId>,
    pub street_name: Option<String>,
    pub drive_id: Option<DriveId>,
    pub resident_id: Option<ResidentId>,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
struct StopRequestRow {
    #[serde(default)]
    id: Option<StopRequestId>,
    #[serde(default)]
    street_name: Option<String>,
    #[serde(default)]
    drive_id: Option<DriveId>,
    #[serde(default)]
    resident_id: Option<ResidentId>,
    #[serde(default)]
    requestee_id: Option<ResidentId>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<StopRequestRow> for StopRequest {
    fn from(row: StopRequestRow) -> Self {
        Self {
            id: row.id,
            street_name: row.street_name,
            drive_id: row.drive_id,
            resident_id: row.resident_id.or(row.requestee_id),
            created_at: row.created_at,
        }
    }
}
