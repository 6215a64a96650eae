use crate::model::{Order, ShippingAddress, WholesalerGroup};
use serde::Serialize;
use shared::utils::format_order_date;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    /// Unit price in cents.
    pub price: i64,
}

impl NotificationItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Payload handed to the transport for one wholesaler group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub order_number: String,
    pub order_date: String,
    pub shipping_address: ShippingAddress,
    pub items: Vec<NotificationItem>,
    pub notes: Option<String>,
}

impl OrderData {
    pub fn for_group(order: &Order, group: &WholesalerGroup) -> Self {
        Self {
            order_number: order.order_number.clone(),
            order_date: format_order_date(&order.created_at),
            shipping_address: order.shipping_address.clone(),
            items: group
                .items
                .iter()
                .map(|item| NotificationItem {
                    product_name: item.product_name.clone(),
                    product_code: item.product_code.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            notes: order.notes.clone(),
        }
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}€{}.{:02}", cents / 100, cents % 100)
}
