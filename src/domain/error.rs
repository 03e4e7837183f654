// Error taxonomy for the monitoring core
use thiserror::Error;

/// Coarse classification of a [`MonitoringError`], used by hosts to pick a
/// status for the query-status UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Authorization,
    Protocol,
    Parse,
    Validation,
    NotFound,
    EmptyResult,
    Cancelled,
    Config,
}

#[derive(Debug, Error)]
pub enum MonitoringError {
    /// Network or DNS failure while talking to the server.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} timed out after {timeout_secs}s")]
    TimedOut {
        endpoint: String,
        timeout_secs: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("access denied on {endpoint}: please verify API token and permissions")]
    AccessDenied { endpoint: String },

    #[error("unexpected status code {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    /// Payload could not be decoded into the expected shape.
    #[error("failed to parse {context} ({payload_len} bytes): {detail}")]
    Parse {
        context: String,
        payload_len: usize,
        detail: String,
    },

    #[error("unparseable datetime '{input}' (tried: {})", attempted.join(", "))]
    DateTime {
        input: String,
        attempted: Vec<&'static str>,
    },

    #[error("invalid query: {0}")]
    Validation(String),

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("no data found for {what}")]
    EmptyResult { what: String },

    #[error("query cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MonitoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::TimedOut { .. } => ErrorKind::Transport,
            Self::AccessDenied { .. } => ErrorKind::Authorization,
            Self::UnexpectedStatus { .. } => ErrorKind::Protocol,
            Self::Parse { .. } | Self::DateTime { .. } => ErrorKind::Parse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn empty(what: impl Into<String>) -> Self {
        Self::EmptyResult { what: what.into() }
    }

    pub fn parse(context: impl Into<String>, payload_len: usize, detail: impl ToString) -> Self {
        Self::Parse {
            context: context.into(),
            payload_len,
            detail: detail.to_string(),
        }
    }
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;
