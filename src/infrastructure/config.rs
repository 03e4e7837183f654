use crate::domain::averaging::{AveragingPolicy, AveragingStep};
use crate::domain::error::{MonitoringError, MonitoringResult};
use chrono::FixedOffset;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Row ceiling for listings and historic data. Larger result sets are
/// truncated by the server.
const DEFAULT_PAGE_SIZE: u32 = 50_000;

#[derive(Debug, Deserialize, Clone)]
pub struct PrtgConfig {
    pub prtg: PrtgSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrtgSettings {
    /// Server address, with or without scheme. A bare host gets `https://`.
    pub host: String,
    pub api_token: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Self-signed certificates are the norm for PRTG installs, so
    /// verification is off unless a CA certificate is pinned.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    /// PEM file added as a trusted root.
    #[serde(default)]
    pub ca_certificate: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Offset of the server's wall clock, used for naive datetimes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// What to do with a historic row whose channel is missing or not numeric.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    #[default]
    Skip,
    Zero,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuerySettings {
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
    #[serde(default)]
    pub averaging: Option<AveragingSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AveragingSettings {
    #[serde(default)]
    pub steps: Vec<AveragingStep>,
    pub fallback_seconds: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PrtgSettings {
    pub fn new(host: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_token: api_token.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: true,
            ca_certificate: None,
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: 0,
        }
    }

    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn server_offset(&self) -> MonitoringResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            MonitoringError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

impl QuerySettings {
    pub fn averaging_policy(&self) -> MonitoringResult<AveragingPolicy> {
        match &self.averaging {
            Some(settings) => AveragingPolicy::new(settings.steps.clone(), settings.fallback_seconds),
            None => Ok(AveragingPolicy::default()),
        }
    }
}

/// `PRTG_` overrides, with `__` separating nested keys.
fn prtg_environment() -> config::Environment {
    config::Environment::with_prefix("PRTG")
        .prefix_separator("_")
        .separator("__")
}

/// Load `config/prtg.{toml,yaml,json}` overlaid with `PRTG_` environment
/// variables, e.g. `PRTG_PRTG__API_TOKEN`.
pub fn load_prtg_config() -> anyhow::Result<PrtgConfig> {
    load_with_environment(prtg_environment())
}

fn load_with_environment(environment: config::Environment) -> anyhow::Result<PrtgConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/prtg").required(false))
        .add_source(environment)
        .build()?;

    Ok(settings.try_deserialize()?)
}
