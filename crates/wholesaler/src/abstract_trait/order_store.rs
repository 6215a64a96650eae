use crate::model::Order;
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynOrderStore = Arc<dyn OrderStoreTrait + Send + Sync>;

#[async_trait]
pub trait OrderStoreTrait {
    /// Paid or processing orders with at least one item still waiting for
    /// its wholesaler, oldest first.
    async fn find_orders_needing_notification(&self) -> Result<Vec<Order>, RepositoryError>;

    async fn find_order_by_id(&self, id: i32) -> Result<Option<Order>, RepositoryError>;

    /// Persists the notification state of every item. Fails with
    /// [`RepositoryError::Conflict`] when `order.version` is stale; on
    /// success the in-memory version is advanced.
    async fn save_order(&self, order: &mut Order) -> Result<(), RepositoryError>;
}
