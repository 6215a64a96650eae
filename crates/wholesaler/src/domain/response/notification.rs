use crate::domain::recovery::RecoveryAction;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Error,
}

/// Outcome of one wholesaler group within one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResult {
    pub order_number: String,
    pub wholesaler_email: String,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryAction>,
}

impl NotificationResult {
    pub fn success(order_number: &str, wholesaler_email: &str, message_id: Option<String>) -> Self {
        Self {
            order_number: order_number.to_string(),
            wholesaler_email: wholesaler_email.to_string(),
            status: NotificationStatus::Success,
            message_id,
            error: None,
            recovery: None,
        }
    }

    pub fn error(
        order_number: &str,
        wholesaler_email: &str,
        error: String,
        recovery: Option<RecoveryAction>,
    ) -> Self {
        Self {
            order_number: order_number.to_string(),
            wholesaler_email: wholesaler_email.to_string(),
            status: NotificationStatus::Error,
            message_id: None,
            error: Some(error),
            recovery,
        }
    }

    /// The message went out but its notified flag could not be stored, so
    /// the wholesaler will be contacted again by a later run.
    pub fn mark_unsaved(&mut self, error: String) {
        self.status = NotificationStatus::Error;
        self.error = Some(error);
    }

    pub fn is_success(&self) -> bool {
        self.status == NotificationStatus::Success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    /// Orders picked up by the sweep.
    pub processed: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub results: Vec<NotificationResult>,
}

impl SweepSummary {
    pub fn new(processed: usize, results: Vec<NotificationResult>) -> Self {
        let success_count = results.iter().filter(|r| r.is_success()).count();

        Self {
            processed,
            success_count,
            error_count: results.len() - success_count,
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotificationOutcome {
    pub order_number: String,
    pub results: Vec<NotificationResult>,
    /// Set when there was nothing left to send.
    #[serde(skip)]
    pub message: Option<String>,
}
