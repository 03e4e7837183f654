// PRTG repository implementation
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::averaging::AveragingPolicy;
use crate::domain::datetime::format_request_datetime;
use crate::domain::entity::{EntityKind, EntityRecord};
use crate::domain::error::{MonitoringError, MonitoringResult};
use crate::domain::historical::{HistoricalPoint, RawValue};
use crate::domain::query::TimeRange;
use crate::domain::status::ServerStatus;
use crate::infrastructure::config::PrtgConfig;
use crate::infrastructure::prtg_client::PrtgClient;
use async_trait::async_trait;
use chrono::FixedOffset;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const TABLE_COLUMNS: &str = "active,channel,datetime,device,group,message,objid,priority,sensor,status,tags";
const HISTORIC_COLUMNS: &str = "datetime,value_";

#[derive(Debug, Clone)]
pub struct PrtgRepository {
    client: PrtgClient,
    page_size: u32,
    server_offset: FixedOffset,
    averaging: AveragingPolicy,
}

#[derive(Debug, Deserialize)]
struct TableListResponse {
    #[serde(default)]
    groups: Option<Vec<EntityRow>>,
    #[serde(default)]
    devices: Option<Vec<EntityRow>>,
    #[serde(default)]
    sensors: Option<Vec<EntityRow>>,
}

/// One row of a table listing. Fields drift between string and numeric
/// encodings across server versions, hence the lenient decoders.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntityRow {
    #[serde(deserialize_with = "lenient_string")]
    group: String,
    #[serde(deserialize_with = "lenient_string")]
    device: String,
    #[serde(deserialize_with = "lenient_string")]
    sensor: String,
    #[serde(deserialize_with = "lenient_i64")]
    objid: i64,
    #[serde(deserialize_with = "lenient_string")]
    status: String,
    #[serde(deserialize_with = "lenient_i64")]
    status_raw: i64,
    #[serde(deserialize_with = "lenient_bool")]
    active: bool,
    #[serde(deserialize_with = "lenient_i64")]
    active_raw: i64,
    #[serde(deserialize_with = "lenient_string")]
    priority: String,
    #[serde(deserialize_with = "lenient_i64")]
    priority_raw: i64,
    #[serde(deserialize_with = "lenient_string")]
    message: String,
    #[serde(deserialize_with = "lenient_string")]
    message_raw: String,
    #[serde(deserialize_with = "lenient_string")]
    tags: String,
    #[serde(deserialize_with = "lenient_string")]
    tags_raw: String,
    #[serde(deserialize_with = "lenient_string")]
    datetime: String,
    #[serde(deserialize_with = "lenient_opt_f64")]
    datetime_raw: Option<f64>,
}

impl EntityRow {
    fn into_record(self, kind: EntityKind) -> EntityRecord {
        let name = match kind {
            EntityKind::Group => self.group.clone(),
            EntityKind::Device => self.device.clone(),
            EntityKind::Sensor => self.sensor.clone(),
        };
        EntityRecord {
            kind,
            name,
            object_id: self.objid,
            status: self.status,
            status_raw: self.status_raw,
            active: self.active,
            active_raw: self.active_raw,
            priority: self.priority,
            priority_raw: self.priority_raw,
            message: self.message,
            message_raw: self.message_raw,
            tags: self.tags,
            tags_raw: self.tags_raw,
            group: self.group,
            device: self.device,
            datetime: self.datetime,
            datetime_raw: self.datetime_raw,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoricDataResponse {
    #[serde(default)]
    histdata: Vec<HistoricalPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusResponse {
    #[serde(rename = "Version", alias = "version", deserialize_with = "lenient_string")]
    version: String,
    #[serde(
        rename = "prtgversion",
        alias = "PRTGVersion",
        alias = "prtg-version",
        deserialize_with = "lenient_string"
    )]
    prtg_version: String,
    #[serde(rename = "Clock", alias = "clock", deserialize_with = "lenient_string")]
    clock: String,
    #[serde(rename = "TotalSens", alias = "totalsens", deserialize_with = "lenient_i64")]
    total_sensors: i64,
    #[serde(rename = "Alarms", alias = "alarms", deserialize_with = "lenient_string")]
    alarms: String,
    #[serde(rename = "ReadOnlyUser", alias = "readonlyuser", deserialize_with = "lenient_string")]
    read_only_user: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default()
        }
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawValue::from(Value::deserialize(deserializer)?).as_f64())
}

fn decode<T: DeserializeOwned>(context: &str, body: &[u8]) -> MonitoringResult<T> {
    serde_json::from_slice(body).map_err(|e| MonitoringError::parse(context, body.len(), e))
}

impl PrtgRepository {
    pub fn new(
        client: PrtgClient,
        page_size: u32,
        server_offset: FixedOffset,
        averaging: AveragingPolicy,
    ) -> Self {
        Self {
            client,
            page_size,
            server_offset,
            averaging,
        }
    }

    pub fn from_config(config: &PrtgConfig) -> MonitoringResult<Self> {
        Ok(Self::new(
            PrtgClient::new(&config.prtg)?,
            config.prtg.page_size,
            config.prtg.server_offset()?,
            config.query.averaging_policy()?,
        ))
    }

    fn warn_if_truncated(&self, what: &str, rows: usize) {
        if rows >= self.page_size as usize {
            tracing::warn!(
                "{} returned {} rows, the configured ceiling; further rows are not fetched",
                what,
                rows
            );
        }
    }
}

#[async_trait]
impl MonitoringRepository for PrtgRepository {
    async fn status(&self) -> MonitoringResult<ServerStatus> {
        let body = self.client.execute("status.json", &[]).await?;
        let response: StatusResponse = decode("server status", &body)?;

        Ok(ServerStatus {
            version: response.version,
            prtg_version: response.prtg_version,
            clock: response.clock,
            total_sensors: response.total_sensors,
            alarms: response.alarms,
            read_only_user: response.read_only_user,
        })
    }

    async fn entities(&self, kind: EntityKind) -> MonitoringResult<Vec<EntityRecord>> {
        let params = [
            ("content", kind.table_content().to_string()),
            ("columns", TABLE_COLUMNS.to_string()),
            ("count", self.page_size.to_string()),
        ];
        let body = self.client.execute("table.json", &params).await?;

        let context = format!("{} table", kind.table_content());
        let response: TableListResponse = decode(&context, &body)?;
        let rows = match kind {
            EntityKind::Group => response.groups,
            EntityKind::Device => response.devices,
            EntityKind::Sensor => response.sensors,
        }
        .ok_or_else(|| {
            MonitoringError::parse(
                &context,
                body.len(),
                format!("response has no '{}' key", kind.table_content()),
            )
        })?;

        tracing::debug!("Fetched {} {}", rows.len(), kind.table_content());
        self.warn_if_truncated(&context, rows.len());

        Ok(rows.into_iter().map(|row| row.into_record(kind)).collect())
    }

    async fn historical_data(
        &self,
        object_id: &str,
        range: TimeRange,
    ) -> MonitoringResult<Vec<HistoricalPoint>> {
        let object_id = object_id.trim();
        if object_id.is_empty() {
            return Err(MonitoringError::validation("missing object id"));
        }
        if !range.is_ordered() {
            return Err(MonitoringError::validation(format!(
                "time range start {} must be before end {}",
                range.from, range.to
            )));
        }

        let avg = self.averaging.select(range.span_hours());
        let params = [
            ("id", object_id.to_string()),
            ("avg", avg.to_string()),
            ("sdate", format_request_datetime(range.from, self.server_offset)),
            ("edate", format_request_datetime(range.to, self.server_offset)),
            ("count", self.page_size.to_string()),
            ("usecaption", "1".to_string()),
            ("columns", HISTORIC_COLUMNS.to_string()),
        ];

        tracing::debug!(object_id, avg, "Fetching historic data");
        let body = self.client.execute("historicdata.json", &params).await?;
        let response: HistoricDataResponse = decode("historic data", &body)?;

        if response.histdata.is_empty() {
            return Err(MonitoringError::empty(format!(
                "object {} between {} and {}",
                object_id, range.from, range.to
            )));
        }
        self.warn_if_truncated("historic data", response.histdata.len());

        Ok(response.histdata)
    }
}
