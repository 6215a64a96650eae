//! Reusable guards for calls into unreliable external dependencies.
//!
//! Each dependency owns its own [`CircuitBreaker`]; breaker state lives in
//! process memory and is not shared between service instances.

mod circuit_breaker;
mod retry;

pub use self::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStatus, CircuitState,
};
pub use self::retry::{RetryConfig, retry_with_backoff};
