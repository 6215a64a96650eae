use crate::{
    abstract_trait::FailureClassifier,
    domain::recovery::{NotificationContext, RecoveryAction},
};
use chrono::{TimeDelta, Utc};
use shared::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig, retry_with_backoff,
};
use std::fmt::Display;
use std::future::Future;
use tracing::{error, info, warn};

pub const NOTIFICATION_BREAKER_NAME: &str = "wholesaler-notification";

const RETRY_QUEUE_DELAY_MINUTES: i64 = 10;
const ALTERNATIVE_METHOD: &str = "webhook";

/// Circuit breaker plus retry around a single wholesaler send, and the
/// classification of sends that still failed.
pub struct WholesalerErrorRecovery {
    circuit_breaker: CircuitBreaker,
    retry: RetryConfig,
}

impl WholesalerErrorRecovery {
    pub fn new(breaker_config: CircuitBreakerConfig, retry: RetryConfig) -> Self {
        Self {
            circuit_breaker: CircuitBreaker::new(NOTIFICATION_BREAKER_NAME, breaker_config),
            retry,
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Retries happen inside the breaker, so one exhausted retry cycle
    /// counts as a single breaker failure.
    pub async fn send_notification<F, Fut, T, E>(
        &self,
        label: &str,
        operation: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.circuit_breaker
            .execute(|| retry_with_backoff(operation, label, &self.retry))
            .await
    }

    pub fn handle_notification_failure(
        &self,
        error_message: &str,
        context: &NotificationContext<'_>,
    ) -> RecoveryAction {
        let lowered = error_message.to_lowercase();

        if lowered.contains("network") || lowered.contains("timeout") {
            let retry_at = Utc::now() + TimeDelta::minutes(RETRY_QUEUE_DELAY_MINUTES);
            warn!(
                order_number = context.order_number,
                wholesaler_email = context.wholesaler_email,
                %retry_at,
                "Wholesaler notification queued for retry"
            );
            return RecoveryAction::QueuedForRetry { retry_at };
        }

        if lowered.contains("invalid_email") || lowered.contains("bounced") {
            info!(
                order_number = context.order_number,
                wholesaler_email = context.wholesaler_email,
                method = ALTERNATIVE_METHOD,
                "Wholesaler address rejected, alternative channel suggested"
            );
            return RecoveryAction::AlternativeMethodAttempted {
                method: ALTERNATIVE_METHOD.to_string(),
            };
        }

        error!(
            order_number = context.order_number,
            wholesaler_email = context.wholesaler_email,
            error = error_message,
            "Wholesaler notification escalated"
        );
        RecoveryAction::Escalated {
            error: error_message.to_string(),
        }
    }
}

impl FailureClassifier for WholesalerErrorRecovery {
    fn classify(&self, error_message: &str, context: &NotificationContext<'_>) -> RecoveryAction {
        self.handle_notification_failure(error_message, context)
    }
}
