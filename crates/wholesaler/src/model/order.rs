use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

/// Wholesaler details captured when the order was placed, plus the
/// notification bookkeeping for that line item.
///
/// `notified` only ever moves from false to true, and `notified_at` is
/// present exactly when `notified` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WholesalerNotification {
    name: String,
    email: String,
    product_code: String,
    notified: bool,
    notified_at: Option<DateTime<Utc>>,
    notification_attempts: i32,
    last_notification_error: Option<String>,
}

impl WholesalerNotification {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            product_code: product_code.into(),
            notified: false,
            notified_at: None,
            notification_attempts: 0,
            last_notification_error: None,
        }
    }

    /// Rebuilds a persisted record. Returns `None` when the stored flag and
    /// timestamp disagree.
    pub fn from_record(
        name: String,
        email: String,
        product_code: String,
        notified: bool,
        notified_at: Option<DateTime<Utc>>,
        notification_attempts: i32,
        last_notification_error: Option<String>,
    ) -> Option<Self> {
        if notified != notified_at.is_some() {
            return None;
        }

        Some(Self {
            name,
            email,
            product_code,
            notified,
            notified_at,
            notification_attempts,
            last_notification_error,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn notified(&self) -> bool {
        self.notified
    }

    pub fn notified_at(&self) -> Option<DateTime<Utc>> {
        self.notified_at
    }

    pub fn notification_attempts(&self) -> i32 {
        self.notification_attempts
    }

    pub fn last_notification_error(&self) -> Option<&str> {
        self.last_notification_error.as_deref()
    }

    pub fn has_wholesaler(&self) -> bool {
        !self.email.trim().is_empty()
    }

    pub fn is_pending(&self) -> bool {
        !self.notified && self.has_wholesaler()
    }

    /// Returns false when the item was already notified; the record is then
    /// left untouched.
    pub fn mark_notified(&mut self, at: DateTime<Utc>) -> bool {
        if self.notified {
            return false;
        }

        self.notification_attempts += 1;
        self.notified = true;
        self.notified_at = Some(at);
        self.last_notification_error = None;
        true
    }

    pub fn record_failure(&mut self, error: &str) -> bool {
        if self.notified {
            return false;
        }

        self.notification_attempts += 1;
        self.last_notification_error = Some(error.to_string());
        true
    }

    /// Keeps the error for a send that never reached the transport, without
    /// counting an attempt.
    pub fn record_skipped(&mut self, error: &str) -> bool {
        if self.notified {
            return false;
        }

        self.last_notification_error = Some(error.to_string());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub order_item_id: i32,
    pub product_id: Option<i32>,
    /// Resolved from the catalogue; `None` when the product was deleted.
    pub product_name: Option<String>,
    pub quantity: i32,
    /// Unit price in cents.
    pub price: i64,
    pub wholesaler: WholesalerNotification,
}

impl OrderItem {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(UNKNOWN_PRODUCT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: i32,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    /// Optimistic concurrency token, bumped by every successful save.
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItem {
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub price: i64,
}

/// Pending line items of one order that go to the same wholesaler address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WholesalerGroup {
    pub wholesaler_email: String,
    pub wholesaler_name: String,
    pub items: Vec<GroupItem>,
}

impl Order {
    pub fn is_eligible_for_notification(&self) -> bool {
        self.payment_status == PaymentStatus::Paid || self.status == OrderStatus::Processing
    }

    pub fn has_pending_notifications(&self) -> bool {
        self.items.iter().any(|item| item.wholesaler.is_pending())
    }

    pub fn needs_notification(&self) -> bool {
        self.is_eligible_for_notification() && self.has_pending_notifications()
    }

    /// Groups pending items by wholesaler email, in the order each address is
    /// first seen while scanning the items.
    pub fn pending_wholesaler_groups(&self) -> Vec<WholesalerGroup> {
        let mut groups: Vec<WholesalerGroup> = Vec::new();

        for item in self.items.iter().filter(|item| item.wholesaler.is_pending()) {
            let entry = GroupItem {
                product_name: item.display_name().to_string(),
                product_code: item.wholesaler.product_code().to_string(),
                quantity: item.quantity,
                price: item.price,
            };

            match groups
                .iter_mut()
                .find(|group| group.wholesaler_email == item.wholesaler.email())
            {
                Some(group) => group.items.push(entry),
                None => groups.push(WholesalerGroup {
                    wholesaler_email: item.wholesaler.email().to_string(),
                    wholesaler_name: item.wholesaler.name().to_string(),
                    items: vec![entry],
                }),
            }
        }

        groups
    }

    /// Flags every still-pending item for `email` as notified at `at`.
    /// Returns how many items changed.
    pub fn mark_group_notified(&mut self, email: &str, at: DateTime<Utc>) -> usize {
        self.items
            .iter_mut()
            .filter(|item| item.wholesaler.email() == email)
            .map(|item| item.wholesaler.mark_notified(at))
            .filter(|changed| *changed)
            .count()
    }

    pub fn record_group_failure(&mut self, email: &str, error: &str) -> usize {
        self.items
            .iter_mut()
            .filter(|item| item.wholesaler.email() == email)
            .map(|item| item.wholesaler.record_failure(error))
            .filter(|changed| *changed)
            .count()
    }

    pub fn record_group_skipped(&mut self, email: &str, error: &str) -> usize {
        self.items
            .iter_mut()
            .filter(|item| item.wholesaler.email() == email)
            .map(|item| item.wholesaler.record_skipped(error))
            .filter(|changed| *changed)
            .count()
    }
}
