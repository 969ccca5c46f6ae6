use serde_json::Value;
use std::time::Duration;

use crate::config::IntegrationsConfig;

/// Failures shared by every outbound HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Parse(String),
}

/// One client per adapter; no retries, bounded by the configured timeout.
pub fn http_client(config: &IntegrationsConfig) -> Result<reqwest::Client, IntegrationError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?)
}

/// Reads a JSON body, turning non-2xx statuses into [`IntegrationError::Upstream`].
pub async fn read_json(response: reqwest::Response) -> Result<Value, IntegrationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IntegrationError::Upstream { status: status.as_u16(), body });
    }
    Ok(response.json::<Value>().await?)
}
