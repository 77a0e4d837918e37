// REST Client for public venue market data
// Rate-limited JSON-over-HTTP client shared by every venue connector

use parking_lot::Mutex as SyncMutex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum RestClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Rate Limiter
// ============================================================================

/// Token bucket rate limiter for API requests.
/// Used behind a `Mutex`, so no internal lock.
pub struct RateLimiter {
    tokens: f64,
    pub max_tokens: f64,
    rate_per_sec: f64,
    last_update: f64,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1) as f64;
        Self {
            tokens: rpm,
            max_tokens: rpm,
            rate_per_sec: rpm / 60.0,
            last_update: now_secs(),
        }
    }

    /// Wait until a token is available (caller must hold the Mutex)
    pub async fn acquire(&mut self) {
        loop {
            self.add_tokens();

            if self.tokens >= 1.0 {
                self.tokens -= 1.0;
                return;
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    fn add_tokens(&mut self) {
        let now = now_secs();
        let elapsed = now - self.last_update;
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.max_tokens);
        self.last_update = now;
    }
}

/// Wall-clock seconds since epoch
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Wall-clock milliseconds since epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

// ============================================================================
// Client Statistics
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RestClientStats {
    pub requests_sent: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub success_rate: f64,
}

impl fmt::Display for RestClientStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RestClientStats(sent={}, ok={}, fail={}, rate={:.2}%)",
            self.requests_sent, self.requests_succeeded, self.requests_failed,
            self.success_rate * 100.0
        )
    }
}

#[derive(Debug, Default)]
struct Counters {
    sent: u64,
    succeeded: u64,
    failed: u64,
}

// ============================================================================
// REST Client
// ============================================================================

/// Public market-data REST client for one venue.
///
/// Features:
/// - Token bucket rate limiting
/// - Configurable timeout and user agent
/// - Non-2xx responses surfaced as `RestClientError::Api`
///
/// Requests are never retried here; a failed fetch is retried on the next
/// refresh tick by the engine.
pub struct RestClient {
    base_url: String,
    client: Client,
    limiter: Mutex<RateLimiter>,
    counters: SyncMutex<Counters>,
}

impl RestClient {
    pub fn new(
        base_url: &str,
        requests_per_minute: u32,
        timeout_seconds: u64,
        user_agent: &str,
    ) -> Result<Self, RestClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            limiter: Mutex::new(RateLimiter::new(requests_per_minute)),
            counters: SyncMutex::new(Counters::default()),
        })
    }

    /// Create from the venue section of the config
    pub fn from_config(
        config: &crate::core::VenueConfig,
        venue: crate::core::VenueId,
    ) -> Result<Self, RestClientError> {
        Self::new(
            config.base_url(venue),
            config.requests_per_minute,
            config.request_timeout_seconds as u64,
            &config.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` with query parameters
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, RestClientError> {
        self.limiter.lock().await.acquire().await;
        let url = format!("{}{}", self.base_url, endpoint);
        self.counters.lock().sent += 1;

        let result = self.client.get(&url).query(params).send().await;
        self.finish(result).await
    }

    /// POST a JSON body to `endpoint`
    pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value, RestClientError> {
        self.limiter.lock().await.acquire().await;
        let url = format!("{}{}", self.base_url, endpoint);
        self.counters.lock().sent += 1;

        let result = self.client.post(&url).json(body).send().await;
        self.finish(result).await
    }

    async fn finish(
        &self,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Value, RestClientError> {
        let outcome = match result {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await;
                match body {
                    Ok(text) if status.is_success() => serde_json::from_str::<Value>(&text)
                        .map_err(RestClientError::from),
                    Ok(text) => Err(api_error(status.as_u16(), &text)),
                    Err(e) => Err(RestClientError::Http(e)),
                }
            }
            Err(e) => Err(RestClientError::Http(e)),
        };

        let mut counters = self.counters.lock();
        match &outcome {
            Ok(_) => counters.succeeded += 1,
            Err(e) => {
                counters.failed += 1;
                tracing::debug!(base_url = %self.base_url, error = %e, "Request failed");
            }
        }
        outcome
    }

    /// Get client statistics
    pub fn get_stats(&self) -> RestClientStats {
        let counters = self.counters.lock();
        RestClientStats {
            requests_sent: counters.sent,
            requests_succeeded: counters.succeeded,
            requests_failed: counters.failed,
            success_rate: if counters.sent > 0 {
                counters.succeeded as f64 / counters.sent as f64
            } else {
                0.0
            },
        }
    }
}

/// Build an API error from a non-2xx body. Venues disagree on the error shape,
/// so look for the common code/message keys and fall back to the HTTP status.
fn api_error(status: u16, body: &str) -> RestClientError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code").or_else(|| v.get("retCode")))
        .and_then(|c| c.as_i64())
        .unwrap_or(status as i64);
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("msg").or_else(|| v.get("message")).or_else(|| v.get("retMsg")))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let trimmed: String = body.chars().take(200).collect();
            if trimmed.is_empty() { format!("HTTP {}", status) } else { trimmed }
        });

    RestClientError::Api { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(1200);
        assert_eq!(limiter.max_tokens, 1200.0);

        let floor = RateLimiter::new(0);
        assert_eq!(floor.max_tokens, 1.0);
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire_consumes_token() {
        let mut limiter = RateLimiter::new(60);
        limiter.acquire().await;
        assert!(limiter.tokens < 60.0);
    }

    #[test]
    fn test_api_error_binance_shape() {
        match api_error(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#) {
            RestClientError::Api { code, message } => {
                assert_eq!(code, -1121);
                assert_eq!(message, "Invalid symbol.");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_api_error_coinbase_shape() {
        match api_error(404, r#"{"message":"NotFound"}"#) {
            RestClientError::Api { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "NotFound");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_api_error_plain_body() {
        match api_error(502, "") {
            RestClientError::Api { code, message } => {
                assert_eq!(code, 502);
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_client_creation_from_config() {
        let config = crate::core::VenueConfig::default();
        let client = RestClient::from_config(&config, crate::core::VenueId::Coinbase).unwrap();
        assert_eq!(client.base_url(), "https://api.exchange.coinbase.com");
    }

    #[test]
    fn test_stats_initial() {
        let client = RestClient::new("https://example.invalid/", 1200, 10, "test").unwrap();
        assert_eq!(client.base_url(), "https://example.invalid");

        let stats = client.get_stats();
        assert_eq!(stats.requests_sent, 0);
        assert_eq!(stats.requests_failed, 0);
        assert_eq!(stats.success_rate, 0.0);
    }
}
