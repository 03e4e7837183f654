// Monitored object domain model (groups, devices, sensors)
use crate::domain::error::{MonitoringError, MonitoringResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Group,
    Device,
    Sensor,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Group, EntityKind::Device, EntityKind::Sensor];

    /// Value of the `content` parameter of a table listing.
    pub fn table_content(self) -> &'static str {
        match self {
            EntityKind::Group => "groups",
            EntityKind::Device => "devices",
            EntityKind::Sensor => "sensors",
        }
    }

    /// Column holding the object's own name.
    pub fn name_column(self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Device => "device",
            EntityKind::Sensor => "sensor",
        }
    }

    pub fn parse(value: &str) -> MonitoringResult<Self> {
        let wanted = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name_column() == wanted)
            .ok_or_else(|| {
                MonitoringError::validation(format!(
                    "invalid property type '{}', expected one of group, device, sensor",
                    value
                ))
            })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_column())
    }
}

/// A group, device or sensor as listed by the server.
///
/// Most fields come in two flavours: a display string and a `_raw` value
/// (numeric codes, unformatted text). Records are fetched per query and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub name: String,
    pub object_id: i64,
    pub status: String,
    pub status_raw: i64,
    pub active: bool,
    pub active_raw: i64,
    pub priority: String,
    pub priority_raw: i64,
    pub message: String,
    pub message_raw: String,
    pub tags: String,
    pub tags_raw: String,
    /// Parent group (for groups, the group itself).
    pub group: String,
    /// Parent device; empty for groups.
    pub device: String,
    pub datetime: String,
    pub datetime_raw: Option<f64>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            object_id: 0,
            status: String::new(),
            status_raw: 0,
            active: false,
            active_raw: 0,
            priority: String::new(),
            priority_raw: 0,
            message: String::new(),
            message_raw: String::new(),
            tags: String::new(),
            tags_raw: String::new(),
            group: String::new(),
            device: String::new(),
            datetime: String::new(),
            datetime_raw: None,
        }
    }

    /// True when this record sits under the given parents. Empty parents
    /// do not constrain the match; groups have no parent linkage.
    pub fn is_under(&self, group: &str, device: &str) -> bool {
        match self.kind {
            EntityKind::Group => true,
            EntityKind::Device => group.is_empty() || self.group == group,
            EntityKind::Sensor => device.is_empty() || self.device == device,
        }
    }
}
