use crate::model::{Order, OrderStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingWholesaler {
    pub wholesaler_name: String,
    pub wholesaler_email: String,
    pub product_code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order_id: i32,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub pending_wholesalers: Vec<PendingWholesaler>,
}

impl From<&Order> for PendingOrder {
    fn from(order: &Order) -> Self {
        PendingOrder {
            order_id: order.order_id,
            order_number: order.order_number.clone(),
            order_date: order.created_at,
            status: order.status,
            payment_status: order.payment_status,
            pending_wholesalers: order
                .items
                .iter()
                .filter(|item| item.wholesaler.is_pending())
                .map(|item| PendingWholesaler {
                    wholesaler_name: item.wholesaler.name().to_string(),
                    wholesaler_email: item.wholesaler.email().to_string(),
                    product_code: item.wholesaler.product_code().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrdersResponse {
    pub count: usize,
    pub orders: Vec<PendingOrder>,
}

impl From<&[Order]> for PendingOrdersResponse {
    fn from(orders: &[Order]) -> Self {
        let orders: Vec<PendingOrder> = orders.iter().map(PendingOrder::from).collect();

        PendingOrdersResponse {
            count: orders.len(),
            orders,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WholesalerStatusEntry {
    pub wholesaler_name: String,
    pub wholesaler_email: String,
    pub product_code: String,
    pub notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub notification_attempts: i32,
    pub last_notification_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderWholesalerStatus {
    pub order_number: String,
    pub wholesalers: Vec<WholesalerStatusEntry>,
}

impl From<&Order> for OrderWholesalerStatus {
    fn from(order: &Order) -> Self {
        OrderWholesalerStatus {
            order_number: order.order_number.clone(),
            wholesalers: order
                .items
                .iter()
                .filter(|item| item.wholesaler.has_wholesaler())
                .map(|item| WholesalerStatusEntry {
                    wholesaler_name: item.wholesaler.name().to_string(),
                    wholesaler_email: item.wholesaler.email().to_string(),
                    product_code: item.wholesaler.product_code().to_string(),
                    notified: item.wholesaler.notified(),
                    notified_at: item.wholesaler.notified_at(),
                    notification_attempts: item.wholesaler.notification_attempts(),
                    last_notification_error: item
                        .wholesaler
                        .last_notification_error()
                        .map(str::to_string),
                })
                .collect(),
        }
    }
}
