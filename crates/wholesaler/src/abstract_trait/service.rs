use crate::domain::response::{
    OrderNotificationOutcome, OrderWholesalerStatus, PendingOrdersResponse, SweepSummary,
};
use async_trait::async_trait;
use shared::errors::ServiceError;
use std::sync::Arc;

pub type DynWholesalerNotificationService =
    Arc<dyn WholesalerNotificationServiceTrait + Send + Sync>;

#[async_trait]
pub trait WholesalerNotificationServiceTrait {
    async fn process_pending_notifications(&self) -> Result<SweepSummary, ServiceError>;
    async fn process_order_notifications(
        &self,
        order_id: i32,
    ) -> Result<OrderNotificationOutcome, ServiceError>;
    async fn find_pending(&self) -> Result<PendingOrdersResponse, ServiceError>;
    async fn find_order_status(&self, order_id: i32)
    -> Result<OrderWholesalerStatus, ServiceError>;
}
