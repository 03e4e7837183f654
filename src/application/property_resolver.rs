// Property lookup on listed entities
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::datetime::row_datetime;
use crate::domain::entity::{EntityKind, EntityRecord};
use crate::domain::error::{MonitoringError, MonitoringResult};
use crate::domain::frame::FieldValue;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;

/// Wrapper markup PRTG embeds in display messages.
const MESSAGE_MARKUP: [&str; 3] = [r#"<div class="status">"#, r#"<div class="moreicon">"#, "</div>"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyField {
    Status,
    StatusRaw,
    Active,
    ActiveRaw,
    Priority,
    PriorityRaw,
    Message,
    MessageRaw,
    Tags,
    TagsRaw,
}

/// Every property a text or raw query may ask for.
const PROPERTY_TABLE: [(&str, PropertyField); 10] = [
    ("status", PropertyField::Status),
    ("status_raw", PropertyField::StatusRaw),
    ("active", PropertyField::Active),
    ("active_raw", PropertyField::ActiveRaw),
    ("priority", PropertyField::Priority),
    ("priority_raw", PropertyField::PriorityRaw),
    ("message", PropertyField::Message),
    ("message_raw", PropertyField::MessageRaw),
    ("tags", PropertyField::Tags),
    ("tags_raw", PropertyField::TagsRaw),
];

impl PropertyField {
    pub fn parse(name: &str) -> MonitoringResult<Self> {
        let wanted = name.trim().to_lowercase();
        PROPERTY_TABLE
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, field)| *field)
            .ok_or_else(|| {
                let accepted: Vec<&str> = PROPERTY_TABLE.iter().map(|(key, _)| *key).collect();
                MonitoringError::validation(format!(
                    "unknown property '{}', expected one of {}",
                    name,
                    accepted.join(", ")
                ))
            })
    }

    pub fn name(self) -> &'static str {
        PROPERTY_TABLE
            .iter()
            .find(|(_, field)| *field == self)
            .map(|(key, _)| *key)
            .unwrap_or("unknown")
    }

    pub fn extract(self, record: &EntityRecord) -> FieldValue {
        match self {
            PropertyField::Status => FieldValue::Text(record.status.clone()),
            PropertyField::StatusRaw => FieldValue::Number(record.status_raw as f64),
            PropertyField::Active => FieldValue::Text(record.active.to_string()),
            PropertyField::ActiveRaw => FieldValue::Number(record.active_raw as f64),
            PropertyField::Priority => FieldValue::Text(record.priority.clone()),
            PropertyField::PriorityRaw => FieldValue::Number(record.priority_raw as f64),
            PropertyField::Message => FieldValue::Text(sanitize_message(&record.message)),
            PropertyField::MessageRaw => FieldValue::Text(record.message_raw.clone()),
            PropertyField::Tags => FieldValue::Text(record.tags.clone()),
            PropertyField::TagsRaw => FieldValue::Text(record.tags_raw.clone()),
        }
    }
}

pub fn sanitize_message(message: &str) -> String {
    MESSAGE_MARKUP
        .iter()
        .fold(message.to_string(), |acc, tag| acc.replace(tag, ""))
        .trim()
        .to_string()
}

/// The entity a property query points at.
#[derive(Debug, Clone, Copy)]
pub struct PropertyTarget<'a> {
    pub kind: EntityKind,
    pub name: &'a str,
    /// Parent names narrowing the match; empty means unconstrained.
    pub group: &'a str,
    pub device: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub value: FieldValue,
}

/// Pick the target out of a listing and read `field` from it.
///
/// `observed_at` stands in for rows that carry no datetime at all.
pub fn resolve_in(
    records: &[EntityRecord],
    target: &PropertyTarget<'_>,
    field: PropertyField,
    server_offset: FixedOffset,
    observed_at: DateTime<Utc>,
) -> MonitoringResult<Observation> {
    let mut matches = records
        .iter()
        .filter(|r| r.name == target.name && r.is_under(target.group, target.device));

    let record = matches.next().ok_or_else(|| {
        MonitoringError::not_found(format!("{} '{}'", target.kind, target.name))
    })?;
    let duplicates = matches.count();
    if duplicates > 0 {
        tracing::warn!(
            "{} '{}' matched {} entries, using object {}",
            target.kind,
            target.name,
            duplicates + 1,
            record.object_id
        );
    }

    let timestamp = row_datetime(&record.datetime, record.datetime_raw, server_offset)?;
    Ok(Observation {
        timestamp: timestamp.unwrap_or(observed_at),
        value: field.extract(record),
    })
}

#[derive(Clone)]
pub struct PropertyResolver {
    repository: Arc<dyn MonitoringRepository>,
    server_offset: FixedOffset,
}

impl PropertyResolver {
    pub fn new(repository: Arc<dyn MonitoringRepository>, server_offset: FixedOffset) -> Self {
        Self {
            repository,
            server_offset,
        }
    }

    pub async fn resolve(
        &self,
        target: &PropertyTarget<'_>,
        filter_property: &str,
        observed_at: DateTime<Utc>,
    ) -> MonitoringResult<Observation> {
        let field = PropertyField::parse(filter_property)?;
        if target.name.trim().is_empty() {
            return Err(MonitoringError::validation(format!("missing {} name", target.kind)));
        }

        let records = self.repository.entities(target.kind).await?;
        tracing::debug!(
            "Resolving {} of {} '{}' among {} entries",
            field.name(),
            target.kind,
            target.name,
            records.len()
        );
        resolve_in(&records, target, field, self.server_offset, observed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    fn ping_sensor() -> EntityRecord {
        let mut record = EntityRecord::new(EntityKind::Sensor, "Ping");
        record.object_id = 2045;
        record.device = "Router".to_string();
        record.status = "Up".to_string();
        record.status_raw = 3;
        record.active = true;
        record.active_raw = 1;
        record.priority = "***".to_string();
        record.priority_raw = 3;
        record.message = r#"<div class="status">OK <div class="moreicon"></div></div>"#.to_string();
        record.message_raw = "OK".to_string();
        record.tags = "ping".to_string();
        record.tags_raw = "ping pingsensor".to_string();
        record.datetime = "15.02.2025 12:00:00".to_string();
        record
    }

    fn target<'a>(name: &'a str) -> PropertyTarget<'a> {
        PropertyTarget {
            kind: EntityKind::Sensor,
            name,
            group: "",
            device: "",
        }
    }

    #[test]
    fn test_field_table_covers_display_and_raw() {
        let record = ping_sensor();
        let cases = [
            ("status", FieldValue::Text("Up".into())),
            ("status_raw", FieldValue::Number(3.0)),
            ("active", FieldValue::Text("true".into())),
            ("active_raw", FieldValue::Number(1.0)),
            ("priority", FieldValue::Text("***".into())),
            ("priority_raw", FieldValue::Number(3.0)),
            ("message", FieldValue::Text("OK".into())),
            ("message_raw", FieldValue::Text("OK".into())),
            ("tags", FieldValue::Text("ping".into())),
            ("tags_raw", FieldValue::Text("ping pingsensor".into())),
        ];
        for (name, expected) in cases {
            let field = PropertyField::parse(name).unwrap();
            assert_eq!(field.name(), name);
            assert_eq!(field.extract(&record), expected, "field {name}");
        }
    }

    #[test]
    fn test_unknown_field_is_bad_request() {
        let err = PropertyField::parse("uptime").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("status_raw"));
        assert_eq!(PropertyField::parse("Status").unwrap(), PropertyField::Status);
    }

    #[test]
    fn test_sanitize_message() {
        assert_eq!(
            sanitize_message(r#" <div class="status">Down</div><div class="moreicon"></div> "#),
            "Down"
        );
        assert_eq!(sanitize_message("plain"), "plain");
    }

    #[test]
    fn test_resolve_by_exact_name() {
        let records = vec![EntityRecord::new(EntityKind::Sensor, "ping"), ping_sensor()];
        let observation =
            resolve_in(&records, &target("Ping"), PropertyField::StatusRaw, utc(), now()).unwrap();
        assert_eq!(observation.value, FieldValue::Number(3.0));
        assert_eq!(observation.timestamp, Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let records = vec![ping_sensor()];
        let err = resolve_in(&records, &target("Pong"), PropertyField::Status, utc(), now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "not found: sensor 'Pong'");
    }

    #[test]
    fn test_parent_device_narrows_match() {
        let mut other = ping_sensor();
        other.device = "Switch".to_string();
        other.status = "Down".to_string();
        let records = vec![other, ping_sensor()];

        let mut narrowed = target("Ping");
        narrowed.device = "Router";
        let observation = resolve_in(&records, &narrowed, PropertyField::Status, utc(), now()).unwrap();
        assert_eq!(observation.value, FieldValue::Text("Up".into()));

        narrowed.device = "Firewall";
        assert!(resolve_in(&records, &narrowed, PropertyField::Status, utc(), now()).is_err());
    }

    #[test]
    fn test_timestamp_fallbacks() {
        let mut record = ping_sensor();
        record.datetime = String::new();
        let observed = resolve_in(&[record.clone()], &target("Ping"), PropertyField::Status, utc(), now())
            .unwrap();
        assert_eq!(observed.timestamp, now());

        record.datetime_raw = Some(45703.5);
        let observed = resolve_in(&[record.clone()], &target("Ping"), PropertyField::Status, utc(), now())
            .unwrap();
        assert_eq!(observed.timestamp, Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap());

        record.datetime = "garbage".to_string();
        record.datetime_raw = None;
        let err = resolve_in(&[record], &target("Ping"), PropertyField::Status, utc(), now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
