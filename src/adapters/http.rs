//! reqwest-backed [`Transport`] with retry on transient failures.

use crate::domain::model::ApiResponse;
use crate::domain::ports::Transport;
use crate::utils::error::{NuldcError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("nuldc/", env!("CARGO_PKG_VERSION"));

/// Longest `Retry-After` we are willing to wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

const MAX_JITTER_MS: u64 = 250;

/// Exponential backoff with jitter.
///
/// `max_attempts` counts the first try, so `1` disables retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Delay before the retry following failed attempt `attempt` (1-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);
        backoff.min(self.max_delay) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(0..=MAX_JITTER_MS))
    }
}

/// 5xx and 429 are worth another try; everything else is final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// `Retry-After` in seconds, capped. HTTP-date values are ignored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

/// One shared reqwest client. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, retry })
    }

    async fn send(&self, url: &str, build: impl Fn() -> RequestBuilder) -> Result<ApiResponse> {
        let mut attempt = 1;
        loop {
            let can_retry = attempt < self.retry.max_attempts;

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && can_retry {
                        let delay = match status {
                            StatusCode::TOO_MANY_REQUESTS => retry_after(response.headers())
                                .unwrap_or_else(|| self.retry.delay(attempt)),
                            _ => self.retry.delay(attempt),
                        };
                        tracing::warn!(
                            "🔁 {} answered HTTP {}; retrying in {:?} (attempt {}/{})",
                            url,
                            status.as_u16(),
                            delay,
                            attempt + 1,
                            self.retry.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return read_response(url, response).await;
                }
                Err(e) if (e.is_connect() || e.is_timeout()) && can_retry => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "🔁 Request to {} failed: {}; retrying in {:?} (attempt {}/{})",
                        url,
                        e,
                        delay,
                        attempt + 1,
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

async fn read_response(url: &str, response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status();
    let bytes = response.bytes().await?;
    tracing::debug!("📡 {} -> HTTP {} ({} bytes)", url, status.as_u16(), bytes.len());

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(body) => Ok(ApiResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }),
        Err(e) if status.is_success() => Err(NuldcError::decode(url, e)),
        Err(_) => Err(NuldcError::HttpStatusError {
            url: url.to_string(),
            status: status.as_u16(),
        }),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        self.send(url, || {
            let request = self.client.get(url);
            if query.is_empty() {
                request
            } else {
                request.query(query)
            }
        })
        .await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.send(url, || self.client.post(url).json(body)).await
    }
}
