// Historic data rows with dynamic per-channel values
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A channel value as it appears in a historic data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "serde_json::Value")]
pub enum RawValue {
    Number(f64),
    Text(String),
    Unknown(serde_json::Value),
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawValue::Number(f),
                None => RawValue::Unknown(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => RawValue::Text(s),
            other => RawValue::Unknown(other),
        }
    }
}

impl RawValue {
    /// Numbers pass through; text is coerced when it holds a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            RawValue::Unknown(_) => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

fn deserialize_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawValue>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.as_f64()))
}

/// One row of `historicdata.json`. Every key besides the datetime columns is
/// a channel caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    #[serde(default)]
    pub datetime: String,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub datetime_raw: Option<f64>,
    #[serde(flatten)]
    pub values: BTreeMap<String, RawValue>,
}

impl HistoricalPoint {
    pub fn new<K, V>(datetime: impl Into<String>, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
    {
        Self {
            datetime: datetime.into(),
            datetime_raw: None,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a channel by exact name, falling back to a case-insensitive match.
    pub fn channel(&self, name: &str) -> Option<&RawValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value);
        }
        let wanted = name.to_lowercase();
        self.values
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, value)| value)
    }

    /// Channels of this row that carry a numeric value.
    pub fn numeric_channels(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, value)| value.as_f64().is_some())
            .map(|(key, _)| key.as_str())
    }
}
