// Server status summary (status.json)
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerStatus {
    pub version: String,
    pub prtg_version: String,
    pub clock: String,
    pub total_sensors: i64,
    pub alarms: String,
    pub read_only_user: String,
}
