use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// What should happen after a wholesaler notification failed for good.
/// Advisory only: nothing is persisted to a retry queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecoveryAction {
    #[serde(rename_all = "camelCase")]
    QueuedForRetry { retry_at: DateTime<Utc> },
    AlternativeMethodAttempted { method: String },
    Escalated { error: String },
}

#[derive(Debug, Clone)]
pub struct NotificationContext<'a> {
    pub order_number: &'a str,
    pub wholesaler_email: &'a str,
}
