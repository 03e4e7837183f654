// Query descriptor as sent by the host for each visualization query
use crate::domain::error::{MonitoringError, MonitoringResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const RAW_SUFFIX: &str = "_raw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Time series of one channel of one object.
    Metric,
    /// Display value of an entity property.
    Text,
    /// Raw value of an entity property.
    Raw,
}

impl QueryKind {
    pub fn parse(value: &str) -> MonitoringResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "metrics" => Ok(QueryKind::Metric),
            "text" => Ok(QueryKind::Text),
            "raw" => Ok(QueryKind::Raw),
            _ => Err(MonitoringError::validation(format!(
                "unknown query type: '{}'",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn span_hours(&self) -> f64 {
        (self.to - self.from).num_milliseconds() as f64 / 3_600_000.0
    }

    pub fn is_ordered(&self) -> bool {
        self.from < self.to
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    /// Host-side query identifier, only used to correlate logs.
    #[serde(default)]
    pub ref_id: String,
    #[serde(default)]
    pub query_type: String,
    #[serde(default, rename = "objid", alias = "objectId")]
    pub object_id: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub sensor: String,
    #[serde(default)]
    pub channel: String,
    /// Entity kind for property queries: group, device or sensor.
    #[serde(default)]
    pub property: String,
    #[serde(default)]
    pub filter_property: String,
    #[serde(default)]
    pub include_group_name: bool,
    #[serde(default)]
    pub include_device_name: bool,
    #[serde(default)]
    pub include_sensor_name: bool,
    pub time_range: TimeRange,
}

impl QueryDescriptor {
    pub fn new(query_type: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            ref_id: String::new(),
            query_type: query_type.into(),
            object_id: String::new(),
            group: String::new(),
            device: String::new(),
            sensor: String::new(),
            channel: String::new(),
            property: String::new(),
            filter_property: String::new(),
            include_group_name: false,
            include_device_name: false,
            include_sensor_name: false,
            time_range,
        }
    }

    pub fn kind(&self) -> MonitoringResult<QueryKind> {
        QueryKind::parse(&self.query_type)
    }

    /// Field name the property resolver should read for `kind`.
    pub fn effective_filter_property(&self, kind: QueryKind) -> String {
        let filter = self.filter_property.trim();
        if kind == QueryKind::Raw && !filter.to_lowercase().ends_with(RAW_SUFFIX) {
            format!("{}{}", filter, RAW_SUFFIX)
        } else {
            filter.to_string()
        }
    }

    /// Names selected for display, in group/device/sensor order.
    pub fn included_names(&self) -> Vec<&str> {
        [
            (self.include_group_name, self.group.as_str()),
            (self.include_device_name, self.device.as_str()),
            (self.include_sensor_name, self.sensor.as_str()),
        ]
        .into_iter()
        .filter(|(included, name)| *included && !name.is_empty())
        .map(|(_, name)| name)
        .collect()
    }
}
