// Vendor datetime encodings
use crate::domain::error::{MonitoringError, MonitoringResult};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Layout PRTG expects for `sdate` / `edate` request parameters.
pub const REQUEST_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Days between the OLE automation epoch (1899-12-30) and the Unix epoch.
const OLE_UNIX_EPOCH_DAYS: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

struct DateTimeStrategy {
    name: &'static str,
    parse: fn(&str, FixedOffset) -> Option<DateTime<Utc>>,
}

/// Tried in order, first success wins.
const STRATEGIES: [DateTimeStrategy; 4] = [
    DateTimeStrategy {
        name: "DD.MM.YYYY HH:mm:ss",
        parse: parse_dotted,
    },
    DateTimeStrategy {
        name: "RFC 3339",
        parse: parse_rfc3339,
    },
    DateTimeStrategy {
        name: "YYYY-MM-DD-HH-mm-ss",
        parse: parse_request_layout,
    },
    DateTimeStrategy {
        name: "YYYY-MM-DD HH:mm:ss",
        parse: parse_iso_space,
    },
];

fn parse_naive(input: &str, layout: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input, layout).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_dotted(input: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    parse_naive(input, "%d.%m.%Y %H:%M:%S", offset)
}

fn parse_rfc3339(input: &str, _offset: FixedOffset) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_request_layout(input: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    parse_naive(input, REQUEST_FORMAT, offset)
}

fn parse_iso_space(input: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    parse_naive(input, "%Y-%m-%d %H:%M:%S", offset)
}

/// Parse a datetime string as emitted by the monitoring server.
///
/// Averaged rows carry an interval label such as
/// `"15.02.2025 12:00:00 - 12:05:00"`; only the start of the interval is used.
/// Naive encodings are interpreted in the server's `offset`.
pub fn parse_vendor_datetime(input: &str, offset: FixedOffset) -> MonitoringResult<DateTime<Utc>> {
    let trimmed = input.trim();
    let candidate = trimmed
        .split_once(" - ")
        .map(|(start, _)| start.trim())
        .unwrap_or(trimmed);

    STRATEGIES
        .iter()
        .find_map(|strategy| (strategy.parse)(candidate, offset))
        .ok_or_else(|| MonitoringError::DateTime {
            input: input.to_string(),
            attempted: STRATEGIES.iter().map(|s| s.name).collect(),
        })
}

/// Convert an OLE automation date (`datetime_raw`) into UTC.
pub fn ole_to_utc(raw: f64, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let millis = ((raw - OLE_UNIX_EPOCH_DAYS) * SECONDS_PER_DAY * 1000.0).round() as i64;
    let wall_clock = DateTime::from_timestamp_millis(millis)?.naive_utc();
    offset
        .from_local_datetime(&wall_clock)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Timestamp of a row that carries a text `datetime` and an OLE `datetime_raw`.
///
/// The text wins; the OLE value stands in when the text is empty or
/// unparseable. `Ok(None)` when the row carries neither.
pub fn row_datetime(
    text: &str,
    raw: Option<f64>,
    offset: FixedOffset,
) -> MonitoringResult<Option<DateTime<Utc>>> {
    let from_raw = raw.and_then(|raw| ole_to_utc(raw, offset));
    if text.trim().is_empty() {
        return Ok(from_raw);
    }
    match parse_vendor_datetime(text, offset) {
        Ok(timestamp) => Ok(Some(timestamp)),
        Err(err) => from_raw.map(Some).ok_or(err),
    }
}

/// Format a request boundary in the server's wall-clock time.
pub fn format_request_datetime(dt: DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format(REQUEST_FORMAT).to_string()
}
