use crate::{
    abstract_trait::OrderStoreTrait,
    model::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, WholesalerNotification},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{config::ConnectionPool, errors::RepositoryError};
use sqlx::{FromRow, types::Json};
use std::collections::HashMap;
use tracing::{error, info, warn};

#[derive(Debug, FromRow)]
struct OrderRow {
    order_id: i32,
    order_number: String,
    status: String,
    payment_status: String,
    shipping_address: Json<ShippingAddress>,
    notes: Option<String>,
    version: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    order_item_id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name: Option<String>,
    quantity: i32,
    price: i64,
    wholesaler_name: String,
    wholesaler_email: String,
    wholesaler_product_code: String,
    wholesaler_notified: bool,
    wholesaler_notified_at: Option<DateTime<Utc>>,
    wholesaler_notification_attempts: i32,
    wholesaler_last_notification_error: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let wholesaler = WholesalerNotification::from_record(
            row.wholesaler_name,
            row.wholesaler_email,
            row.wholesaler_product_code,
            row.wholesaler_notified,
            row.wholesaler_notified_at,
            row.wholesaler_notification_attempts,
            row.wholesaler_last_notification_error,
        )
        .ok_or_else(|| {
            RepositoryError::Decode(format!(
                "order item {} has a notified flag without timestamp",
                row.order_item_id
            ))
        })?;

        Ok(OrderItem {
            order_item_id: row.order_item_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
            wholesaler,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::Decode(format!("order {}: {e}", self.order_id))
        })?;
        let payment_status = self.payment_status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::Decode(format!("order {}: {e}", self.order_id))
        })?;

        Ok(Order {
            order_id: self.order_id,
            order_number: self.order_number,
            status,
            payment_status,
            shipping_address: self.shipping_address.0,
            notes: self.notes,
            items,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

pub struct OrderRepository {
    db: ConnectionPool,
}

impl OrderRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }

    async fn load_items(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.order_item_id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.price,
                   oi.wholesaler_name, oi.wholesaler_email, oi.wholesaler_product_code,
                   oi.wholesaler_notified, oi.wholesaler_notified_at,
                   oi.wholesaler_notification_attempts, oi.wholesaler_last_notification_error
            FROM order_items oi
            LEFT JOIN products p ON p.product_id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.db)
        .await
        .map_err(|err| {
            error!("❌ Failed to load items for orders {:?}: {:?}", order_ids, err);
            RepositoryError::from(err)
        })?;

        let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            items
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }

        Ok(items)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|row| row.order_id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.order_id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderStoreTrait for OrderRepository {
    async fn find_orders_needing_notification(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.order_id, o.order_number, o.status, o.payment_status,
                   o.shipping_address, o.notes, o.version, o.created_at
            FROM orders o
            WHERE (o.payment_status = 'paid' OR o.status = 'processing')
              AND EXISTS (
                  SELECT 1 FROM order_items oi
                  WHERE oi.order_id = o.order_id
                    AND oi.wholesaler_notified = FALSE
                    AND btrim(oi.wholesaler_email) <> ''
              )
            ORDER BY o.created_at ASC, o.order_id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|err| {
            error!("❌ Failed to query orders needing notification: {:?}", err);
            RepositoryError::from(err)
        })?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let orders = self.assemble(rows).await?;

        info!("📦 Found {} orders needing wholesaler notification", orders.len());
        Ok(orders)
    }

    async fn find_order_by_id(&self, id: i32) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, order_number, status, payment_status,
                   shipping_address, notes, version, created_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| {
            error!("❌ Failed to fetch order {}: {:?}", id, err);
            RepositoryError::from(err)
        })?;

        let Some(row) = row else {
            info!("ℹ️ Order {} not found", id);
            return Ok(None);
        };

        Ok(self.assemble(vec![row]).await?.into_iter().next())
    }

    async fn save_order(&self, order: &mut Order) -> Result<(), RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let bumped = sqlx::query(
            r#"
            UPDATE orders
            SET version = version + 1,
                updated_at = current_timestamp
            WHERE order_id = $1 AND version = $2
            "#,
        )
        .bind(order.order_id)
        .bind(order.version)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to update order {}: {:?}", order.order_id, err);
            RepositoryError::from(err)
        })?;

        if bumped.rows_affected() == 0 {
            warn!(
                "⚠️ Order {} was modified concurrently (version {})",
                order.order_number, order.version
            );
            return Err(RepositoryError::Conflict(format!(
                "order {} was modified concurrently",
                order.order_number
            )));
        }

        for item in &order.items {
            let record = &item.wholesaler;

            // a stored `true` is never reset
            sqlx::query(
                r#"
                UPDATE order_items
                SET wholesaler_notified = wholesaler_notified OR $3,
                    wholesaler_notified_at = COALESCE(wholesaler_notified_at, $4),
                    wholesaler_notification_attempts = $5,
                    wholesaler_last_notification_error = $6
                WHERE order_item_id = $1 AND order_id = $2
                "#,
            )
            .bind(item.order_item_id)
            .bind(order.order_id)
            .bind(record.notified())
            .bind(record.notified_at())
            .bind(record.notification_attempts())
            .bind(record.last_notification_error())
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                error!(
                    "❌ Failed to update item {} of order {}: {:?}",
                    item.order_item_id, order.order_id, err
                );
                RepositoryError::from(err)
            })?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;
        order.version += 1;

        info!("💾 Saved notification state for order {}", order.order_number);
        Ok(())
    }
}
