//! Retry + circuit breaker around a single upstream fetch.
//!
//! The retry loop is the inner policy and the breaker wraps it, so the
//! breaker sees one outcome per call: either a response, or the error left
//! over once retries are exhausted.

use std::future::Future;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::error::AppError;
use crate::traits::FetchResponse;

/// Retry schedule for transient upstream failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Base delay, scaled by `attempt^2` before jitter.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Retry and breaker settings for one upstream endpoint family.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub name: String,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            name: "bustimes".to_string(),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Long-lived policy shared by every fetch in a run.
///
/// Clones share the same breaker and jitter source.
#[derive(Clone)]
pub struct ResiliencePolicy {
    breaker: CircuitBreaker,
    retry: RetryConfig,
    backoff: Backoff,
}

impl ResiliencePolicy {
    pub fn new(config: ResilienceConfig, backoff: Backoff) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.name, config.breaker),
            retry: config.retry,
            backoff,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `operation` under retry and circuit breaking.
    ///
    /// A non-success status becomes `AppError::HttpStatus`; retryable ones
    /// only after every attempt has been used.
    pub async fn execute<F, Fut>(&self, mut operation: F) -> Result<FetchResponse, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<FetchResponse, AppError>>,
    {
        self.breaker
            .call(|| self.with_retry(&mut operation))
            .await
            .map_err(AppError::from)
    }

    async fn with_retry<F, Fut>(&self, operation: &mut F) -> Result<FetchResponse, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<FetchResponse, AppError>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = operation().await.and_then(check_status);

            match outcome {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.backoff.delay(self.retry.base_delay, Some(attempt));
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = %delay.as_millis(),
                        "Transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

fn check_status(response: FetchResponse) -> Result<FetchResponse, AppError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(AppError::HttpStatus {
            status: response.status,
            url: response.url,
        })
    }
}
