use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_gauge(self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before letting a probe call through.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker {name} is OPEN. Next attempt in {}s", .retry_in.as_secs())]
    Open { name: String, retry_in: Duration },

    #[error("{0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitBreakerError::Open { .. })
    }
}

/// Read-only snapshot for health reporting.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub next_attempt: DateTime<Utc>,
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<DateTime<Utc>>,
    next_attempt: DateTime<Utc>,
}

/// Clones share the same underlying state.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    state: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name: String = name.into();

        info!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout.as_millis() as u64,
            "Circuit breaker initialised"
        );

        Self {
            name: Arc::from(name),
            config,
            state: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_time: None,
                next_attempt: Utc::now(),
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `operation` unless the breaker is open. While open, the
    /// operation is not invoked at all.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(retry_in) = self.admit().await {
            return Err(CircuitBreakerError::Open {
                name: self.name.to_string(),
                retry_in,
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    pub async fn status(&self) -> CircuitBreakerStatus {
        let state = self.state.lock().await;
        CircuitBreakerStatus {
            name: self.name.to_string(),
            state: state.state,
            failure_count: state.failure_count,
            last_failure_time: state.last_failure_time,
            next_attempt: state.next_attempt,
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    // Returns the remaining cooldown when the call must be rejected.
    async fn admit(&self) -> Option<Duration> {
        let mut state = self.state.lock().await;

        if state.state != CircuitState::Open {
            return None;
        }

        let now = Utc::now();
        if now < state.next_attempt {
            return Some((state.next_attempt - now).to_std().unwrap_or_default());
        }

        info!(breaker = %self.name, "Circuit breaker transitioning to HALF_OPEN");
        state.state = CircuitState::HalfOpen;
        None
    }

    async fn record_success(&self) {
        let mut state = self.state.lock().await;

        if state.state == CircuitState::HalfOpen {
            info!(breaker = %self.name, "Circuit breaker closing after successful probe");
        }

        state.failure_count = 0;
        state.state = CircuitState::Closed;
    }

    async fn record_failure(&self) {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        state.failure_count += 1;
        state.last_failure_time = Some(now);

        let trips = state.state == CircuitState::HalfOpen
            || state.failure_count >= self.config.failure_threshold;

        if trips {
            let cooldown = TimeDelta::from_std(self.config.reset_timeout).unwrap_or(TimeDelta::MAX);
            state.state = CircuitState::Open;
            state.next_attempt = now.checked_add_signed(cooldown).unwrap_or(DateTime::<Utc>::MAX_UTC);

            warn!(
                breaker = %self.name,
                failure_count = state.failure_count,
                next_attempt = %state.next_attempt,
                "Circuit breaker OPEN"
            );
        }
    }
}
