/*!
 * Provider implementations for different rewrite services.
 *
 * This module contains client implementations for various LLM providers:
 * - Gemini: Google Generative Language API
 * - Anthropic: Anthropic Messages API
 * - Ollama: Local LLM server
 * - Mock: deterministic in-process rewriter for tests
 *
 * Every HTTP client shares `RetryPolicy`: bounded retries with exponential
 * backoff, plus optional request spacing derived from a requests-per-minute
 * limit.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::Mutex;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the rewrite service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Spaces requests evenly to stay under a requests-per-minute limit.
///
/// Shared by all concurrent tasks of one client.
#[derive(Debug)]
pub struct RequestSpacing {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RequestSpacing {
    /// Spacing for `rpm` requests per minute.
    pub fn per_minute(rpm: u32) -> Self {
        Self {
            interval: Duration::from_millis(60_000 / rpm.max(1) as u64),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Interval between two requests.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserve the next slot and wait for it.
    pub async fn wait(&self) {
        let delay = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.interval;
            slot - now
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Retry and rate-limit settings for an HTTP provider
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base backoff time in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
    /// Request spacing, when a rate limit is configured
    spacing: Option<Arc<RequestSpacing>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000, None)
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_retries: u32, backoff_base_ms: u64, rate_limit: Option<u32>) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            spacing: rate_limit
                .filter(|rpm| *rpm > 0)
                .map(|rpm| Arc::new(RequestSpacing::per_minute(rpm))),
        }
    }

    /// Rate limit spacing, if any.
    pub fn spacing(&self) -> Option<&RequestSpacing> {
        self.spacing.as_deref()
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << shift))
    }

    /// Send a request built by `build` and decode a JSON response, retrying
    /// transient failures.
    pub async fn send_json<T, F>(&self, provider: &str, build: F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
            if let Some(spacing) = self.spacing() {
                spacing.wait().await;
            }

            let error = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.map_err(|e| {
                            ProviderError::ConnectionError(format!("Failed to read {} response: {}", provider, e))
                        })?;
                        return serde_json::from_str::<T>(&body).map_err(|e| {
                            error!("Failed to parse {} response: {}", provider, e);
                            ProviderError::ParseError(format!("{}: {}", e, truncate(&body, 500)))
                        });
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    status_error(status, &body)
                }
                Err(e) if e.is_timeout() || e.is_connect() => ProviderError::ConnectionError(e.to_string()),
                Err(e) => ProviderError::RequestFailed(e.to_string()),
            };

            if !error.is_retryable() {
                error!("{} request failed: {}", provider, error);
                return Err(error);
            }

            warn!(
                "{} request failed (attempt {}/{}): {}",
                provider,
                attempt + 1,
                self.max_retries + 1,
                error
            );
            last_error = Some(error);
        }

        debug!("{} giving up after {} attempts", provider, self.max_retries + 1);
        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("{} request failed", provider))
        }))
    }
}

/// Map a non-success HTTP status to a provider error.
pub fn status_error(status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationError(truncate(body, 200))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(truncate(body, 200)),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: truncate(body, 500),
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
