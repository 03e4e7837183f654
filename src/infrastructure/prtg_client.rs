// HTTP transport for the PRTG API
use crate::domain::error::{MonitoringError, MonitoringResult};
use crate::infrastructure::config::PrtgSettings;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;

/// Authenticated GET access to `{base}/api/{endpoint}`.
///
/// Stateless apart from the pooled [`reqwest::Client`], so one instance is
/// shared by all concurrent queries. Requests are never retried.
#[derive(Debug, Clone)]
pub struct PrtgClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    timeout: Duration,
}

impl PrtgClient {
    pub fn new(settings: &PrtgSettings) -> MonitoringResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .danger_accept_invalid_certs(settings.accept_invalid_certs);

        if let Some(path) = &settings.ca_certificate {
            let pem = std::fs::read(path).map_err(|e| {
                MonitoringError::Config(format!("cannot read CA certificate {}: {}", path, e))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                MonitoringError::Config(format!("invalid CA certificate {}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        if settings.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for {}", settings.base_url());
        }

        let http = builder
            .build()
            .map_err(|e| MonitoringError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: settings.base_url(),
            api_token: settings.api_token.clone(),
            timeout: settings.request_timeout(),
        })
    }

    /// Canonical request URL. The token is always the last parameter.
    pub fn build_api_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect();
        query.push(format!("apitoken={}", urlencoding::encode(&self.api_token)));

        format!("{}/api/{}?{}", self.base_url, endpoint, query.join("&"))
    }

    pub async fn execute(&self, endpoint: &str, params: &[(&str, String)]) -> MonitoringResult<Bytes> {
        let url = self.build_api_url(endpoint, params);
        tracing::debug!(endpoint, "Sending PRTG request");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(MonitoringError::AccessDenied {
                endpoint: endpoint.to_string(),
            });
        }
        if status != StatusCode::OK {
            return Err(MonitoringError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        tracing::debug!(endpoint, bytes = body.len(), "Received PRTG response");
        Ok(body)
    }

    fn transport_error(&self, endpoint: &str, error: reqwest::Error) -> MonitoringError {
        // `without_url` keeps the API token out of error messages
        let source = error.without_url();
        if source.is_timeout() {
            tracing::warn!(endpoint, timeout_secs = self.timeout.as_secs(), "PRTG request timed out");
            return MonitoringError::TimedOut {
                endpoint: endpoint.to_string(),
                timeout_secs: self.timeout.as_secs(),
                source,
            };
        }
        MonitoringError::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}
