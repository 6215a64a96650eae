use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay slept after the given failed attempt (1-based):
    /// `min(base_delay * backoff_factor^(attempt-1), max_delay)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Retries `operation` with exponential backoff. The error of the final
/// attempt is returned unchanged.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    context: &str,
    config: &RetryConfig,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(context, attempt, "✅ Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(context, attempt, error = %err, "❌ Operation failed after all retries");
                return Err(err);
            }
            Err(err) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    context,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying after delay"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
