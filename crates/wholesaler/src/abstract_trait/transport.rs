use crate::domain::requests::OrderData;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub type DynNotificationTransport = Arc<dyn NotificationTransportTrait + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReceipt {
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("invalid_email: {0}")]
    InvalidEmail(String),

    #[error("bounced: {0}")]
    Bounced(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("delivery failed: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationTransportTrait {
    /// Sends one message to one wholesaler covering `order_data.items`.
    async fn send(
        &self,
        wholesaler_email: &str,
        order_data: &OrderData,
    ) -> Result<NotificationReceipt, TransportError>;
}
