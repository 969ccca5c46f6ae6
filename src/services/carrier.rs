//! Correios tracking: bearer-token exchange with a shared cache, plus the
//! tracking lookups that use it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::IntegrationsConfig;
use crate::services::integration::{http_client, read_json, IntegrationError};

/// A cached token is reused only while more than this many seconds remain.
pub const REFRESH_MARGIN_SECS: i64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Performs one credential exchange against the carrier.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<IssuedToken, IntegrationError>;
}

/// Process-wide token cache. The lock is held across a refresh, so callers
/// arriving mid-refresh wait for and then share the new token.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    cached: Mutex<Option<IssuedToken>>,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String, IntegrationError> {
        let mut cached = self.cached.lock().await;

        if let Some(current) = cached.as_ref() {
            if current.expires_at - Utc::now() > Duration::seconds(REFRESH_MARGIN_SECS) {
                return Ok(current.token.clone());
            }
            debug!("Carrier token expires at {}, refreshing", current.expires_at);
        }

        let fresh = self.exchange.exchange().await?;
        info!("Obtained carrier token valid until {}", fresh.expires_at);
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// Basic-auth exchange at `{base}/token/v1/autentica`.
pub struct CorreiosExchange {
    http: reqwest::Client,
    base_url: String,
    user: String,
    api_key: Option<String>,
}

impl CorreiosExchange {
    pub fn new(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client(config)?,
            base_url: config.correios_base_url.trim_end_matches('/').to_string(),
            user: config.correios_user.clone(),
            api_key: config.correios_api_key.clone(),
        })
    }
}

#[async_trait]
impl TokenExchange for CorreiosExchange {
    async fn exchange(&self) -> Result<IssuedToken, IntegrationError> {
        let api_key = self.api_key.as_deref().ok_or(IntegrationError::NotConfigured("Correios"))?;

        let response = self
            .http
            .post(format!("{}/token/v1/autentica", self.base_url))
            .basic_auth(&self.user, Some(api_key))
            .send()
            .await?;
        let body = read_json(response).await?;

        let token = body["token"]
            .as_str()
            .ok_or_else(|| IntegrationError::InvalidResponse("token missing from carrier response".to_string()))?;
        let expires_at = body["expiraEm"]
            .as_str()
            .and_then(parse_expiry)
            .ok_or_else(|| IntegrationError::InvalidResponse("expiraEm missing or malformed".to_string()))?;

        Ok(IssuedToken {
            token: token.to_string(),
            expires_at,
        })
    }
}

/// The carrier reports expiry either as RFC 3339 or as naive local (UTC-3) time.
fn parse_expiry(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    let brasilia = FixedOffset::west_opt(3 * 3600)?;
    brasilia
        .from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    AllEvents,
    FirstEvent,
    LastEvent,
}

impl TrackingMode {
    /// Maps the route segment (`events`, `first`, `last`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "events" => Some(TrackingMode::AllEvents),
            "first" => Some(TrackingMode::FirstEvent),
            "last" => Some(TrackingMode::LastEvent),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TrackingMode::AllEvents => "T",
            TrackingMode::FirstEvent => "P",
            TrackingMode::LastEvent => "U",
        }
    }
}

pub struct CarrierClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
}

impl CarrierClient {
    pub fn new(config: &IntegrationsConfig, exchange: Arc<dyn TokenExchange>) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client(config)?,
            base_url: config.correios_base_url.trim_end_matches('/').to_string(),
            tokens: TokenCache::new(exchange),
        })
    }

    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        let exchange = Arc::new(CorreiosExchange::new(config)?);
        Self::new(config, exchange)
    }

    /// Forwards the tracking codes and returns the carrier's body untouched.
    pub async fn track(&self, objects: &[String], mode: TrackingMode) -> Result<Value, IntegrationError> {
        let token = self.tokens.token().await?;
        let url = tracking_url(&self.base_url, objects, mode)?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        read_json(response).await
    }
}

fn tracking_url(base_url: &str, objects: &[String], mode: TrackingMode) -> Result<url::Url, IntegrationError> {
    url::Url::parse_with_params(
        &format!("{}/srorastro/v1/objetos", base_url),
        &[("codigosObjetos", objects.join(",")), ("resultado", mode.code().to_string())],
    )
    .map_err(|e| IntegrationError::InvalidResponse(format!("invalid carrier URL: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExchange {
        calls: AtomicUsize,
        lifetime: Duration,
    }

    impl CountingExchange {
        fn new(lifetime: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                lifetime,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenExchange for CountingExchange {
        async fn exchange(&self) -> Result<IssuedToken, IntegrationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok(IssuedToken {
                token: format!("token-{}", n),
                expires_at: Utc::now() + self.lifetime,
            })
        }
    }

    #[tokio::test]
    async fn reuses_token_far_from_expiry() {
        let exchange = CountingExchange::new(Duration::hours(1));
        let cache = TokenCache::new(exchange.clone());

        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn refreshes_when_inside_margin() {
        let exchange = CountingExchange::new(Duration::minutes(2));
        let cache = TokenCache::new(exchange.clone());

        assert_eq!(cache.token().await.unwrap(), "token-1");
        assert_eq!(cache.token().await.unwrap(), "token-2");
        assert_eq!(cache.token().await.unwrap(), "token-3");
        assert_eq!(exchange.calls(), 3);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let exchange = CountingExchange::new(Duration::hours(1));
        let cache = Arc::new(TokenCache::new(exchange.clone()));

        let requests = (0..8).map(|_| {
            let cache = cache.clone();
            async move { cache.token().await.unwrap() }
        });
        let tokens = futures::future::join_all(requests).await;

        assert!(tokens.iter().all(|t| t == "token-1"));
        assert_eq!(exchange.calls(), 1);
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let config = crate::config::AppConfig::development().integrations;
        let exchange = CorreiosExchange::new(&config).unwrap();
        assert!(matches!(exchange.exchange().await, Err(IntegrationError::NotConfigured("Correios"))));
    }

    #[test]
    fn expiry_accepts_offset_and_local_forms() {
        let with_offset = parse_expiry("2024-05-06T12:00:00-03:00").unwrap();
        let naive_local = parse_expiry("2024-05-06T12:00:00").unwrap();
        assert_eq!(with_offset, naive_local);
        assert_eq!(with_offset.to_rfc3339(), "2024-05-06T15:00:00+00:00");
        assert!(parse_expiry("tomorrow").is_none());
    }

    #[test]
    fn tracking_url_carries_codes_and_mode() {
        let objects = vec!["AA123456789BR".to_string(), "BB987654321BR".to_string()];
        let url = tracking_url("https://api.correios.com.br", &objects, TrackingMode::LastEvent).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.correios.com.br/srorastro/v1/objetos?codigosObjetos=AA123456789BR%2CBB987654321BR&resultado=U"
        );
        assert_eq!(TrackingMode::from_segment("first"), Some(TrackingMode::FirstEvent));
        assert_eq!(TrackingMode::from_segment("all"), None);
    }
}
