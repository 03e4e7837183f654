// Response frame handed back to the host: one time column, one value column
use crate::domain::error::{MonitoringError, MonitoringResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const FRAME_NAME: &str = "response";
pub const LABEL_SEPARATOR: &str = " - ";

/// A single cell of the value column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FrameValues {
    Number(Vec<f64>),
    Text(Vec<String>),
}

impl FrameValues {
    /// Numeric column when every cell is numeric, text column otherwise.
    pub fn from_cells(cells: Vec<FieldValue>) -> Self {
        if cells.iter().all(|c| matches!(c, FieldValue::Number(_))) {
            FrameValues::Number(
                cells
                    .into_iter()
                    .filter_map(|c| match c {
                        FieldValue::Number(n) => Some(n),
                        FieldValue::Text(_) => None,
                    })
                    .collect(),
            )
        } else {
            FrameValues::Text(cells.into_iter().map(|c| c.to_string()).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FrameValues::Number(v) => v.len(),
            FrameValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reorder(self, order: &[usize]) -> Self {
        match self {
            FrameValues::Number(v) => FrameValues::Number(order.iter().map(|&i| v[i]).collect()),
            FrameValues::Text(v) => {
                FrameValues::Text(order.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFrame {
    pub name: String,
    pub display_name: String,
    pub times: Vec<DateTime<Utc>>,
    pub values: FrameValues,
}

impl ResponseFrame {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Join the non-empty label parts with [`LABEL_SEPARATOR`].
pub fn display_label(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

/// Assemble a frame, stable-sorting rows by time.
pub fn build_frame(
    times: Vec<DateTime<Utc>>,
    values: FrameValues,
    label_parts: &[&str],
) -> MonitoringResult<ResponseFrame> {
    let display_name = display_label(label_parts);
    if times.len() != values.len() {
        return Err(MonitoringError::parse(
            format!("frame '{}'", display_name),
            0,
            format!("{} timestamps but {} values", times.len(), values.len()),
        ));
    }
    if times.is_empty() {
        return Err(MonitoringError::empty(if display_name.is_empty() {
            "query".to_string()
        } else {
            display_name
        }));
    }

    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by_key(|&i| times[i]);
    let sorted_times = order.iter().map(|&i| times[i]).collect();

    Ok(ResponseFrame {
        name: FRAME_NAME.to_string(),
        display_name,
        times: sorted_times,
        values: values.reorder(&order),
    })
}
