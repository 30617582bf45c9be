//! Retry manager with exponential backoff
//!
//! Bounded retry for transient fetch failures:
//! - Max attempts: 3 by default (initial request included)
//! - Delay: base * 2^n, capped, with optional ±25% jitter
//! - Only `MonitorError::NetworkError` is retried; everything else is
//!   returned on the first occurrence
//! - Exhaustion yields a `NetworkError` naming the attempt count

use crate::errors::{MonitorError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Default number of attempts, including the first
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff
const BASE_DELAY_MS: u64 = 600;

/// Maximum delay cap
const MAX_DELAY_MS: u64 = 5000;

/// Retry manager with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryManager {
    /// Maximum attempts, including the first
    max_attempts: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryManager {
    /// Create new retry manager with default settings
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Create retry manager with custom settings
    pub fn with_config(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS.max(base_delay_ms),
            enable_jitter: true,
        }
    }

    /// Override the delay cap
    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, enable_jitter: bool) -> Self {
        self.enable_jitter = enable_jitter;
        self
    }

    /// Execute operation with retry logic
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_transient() {
                        return Err(e);
                    }

                    attempt += 1;

                    if attempt >= self.max_attempts {
                        let reason = match e {
                            MonitorError::NetworkError(reason) => reason,
                            other => other.to_string(),
                        };
                        return Err(MonitorError::NetworkError(format!(
                            "giving up after {} attempts: {}",
                            attempt, reason
                        )));
                    }

                    let delay = self.calculate_delay(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "transient fetch failure, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Calculate delay before retry number `retry` (0-based)
    fn calculate_delay(&self, retry: u32) -> Duration {
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        // ±25% random variation
        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Upper bound on time spent sleeping between attempts (jitter excluded)
    pub fn max_total_wait_time(&self) -> Duration {
        let total_ms: u64 = (0..self.max_attempts.saturating_sub(1))
            .map(|retry| {
                self.base_delay_ms
                    .saturating_mul(2u64.saturating_pow(retry))
                    .min(self.max_delay_ms)
            })
            .sum();

        Duration::from_millis(total_ms)
    }

    /// Get max attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let retry_manager = RetryManager::with_config(3, 1);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = retry_manager
            .execute_with_retry(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<i32, MonitorError>(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let retry_manager = RetryManager::with_config(3, 1);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = retry_manager
            .execute_with_retry(move || {
                let counter = counter.clone();
                async move {
                    let current = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 3 {
                        Err(MonitorError::NetworkError("connection reset".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_network_error() {
        let retry_manager = RetryManager::with_config(3, 1);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result = retry_manager
            .execute_with_retry(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(MonitorError::NetworkError("timed out".to_string()))
                }
            })
            .await;

        match result {
            Err(MonitorError::NetworkError(reason)) => {
                assert!(reason.contains("3 attempts"));
                assert!(reason.contains("timed out"));
            }
            other => panic!("expected NetworkError, got {:?}", other),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_errors() {
        let retry_manager = RetryManager::with_config(3, 1);

        for err in [
            MonitorError::RateLimited { retry_after_secs: Some(5) },
            MonitorError::MalformedResponse("bad".to_string()),
        ] {
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = attempts.clone();
            let expected = err.clone();

            let result = retry_manager
                .execute_with_retry(move || {
                    let counter = counter.clone();
                    let err = err.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err::<i32, _>(err)
                    }
                })
                .await;

            assert_eq!(result, Err(expected));
            assert_eq!(attempts.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_calculate_delay() {
        let retry_manager = RetryManager::new().with_jitter(false);

        assert_eq!(retry_manager.calculate_delay(0), Duration::from_millis(600));
        assert_eq!(retry_manager.calculate_delay(1), Duration::from_millis(1200));
        assert_eq!(retry_manager.calculate_delay(2), Duration::from_millis(2400));
        assert_eq!(retry_manager.calculate_delay(3), Duration::from_millis(4800));
        assert_eq!(retry_manager.calculate_delay(10), Duration::from_millis(MAX_DELAY_MS));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let retry_manager = RetryManager::new();
        for _ in 0..50 {
            let delay = retry_manager.calculate_delay(1).as_millis() as u64;
            assert!((900..=1500).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_max_total_wait_time() {
        let retry_manager = RetryManager::new();
        // two sleeps between three attempts: 600 + 1200
        assert_eq!(retry_manager.max_total_wait_time(), Duration::from_millis(1800));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryManager::with_config(0, 10).max_attempts(), 1);
    }
}
