#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use prometheus_client::registry::Registry;
use shared::errors::RepositoryError;
use shared::resilience::{CircuitBreakerConfig, RetryConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wholesaler::{
    abstract_trait::{
        DynNotificationTransport, DynOrderStore, DynWholesalerNotificationService,
        NotificationReceipt, NotificationTransportTrait, OrderStoreTrait, TransportError,
    },
    di::{DependenciesInject, DependenciesInjectDeps},
    domain::requests::OrderData,
    model::{
        Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, WholesalerNotification,
    },
};

pub const W1: &str = "orders@w1.example.com";
pub const W2: &str = "orders@w2.example.com";

/// Order store backed by a map, with the same version check as the
/// PostgreSQL store.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: tokio::sync::Mutex<BTreeMap<i32, Order>>,
    unavailable: AtomicBool,
    conflicts: AtomicU32,
    saves: AtomicU32,
}

impl InMemoryOrderStore {
    pub fn with_orders(orders: Vec<Order>) -> Arc<Self> {
        let map = orders
            .into_iter()
            .map(|order| (order.order_id, order))
            .collect();

        Arc::new(Self {
            orders: tokio::sync::Mutex::new(map),
            ..Self::default()
        })
    }

    pub async fn order(&self, id: i32) -> Order {
        self.orders.lock().await.get(&id).cloned().unwrap()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next `count` saves fail as if another writer got there first.
    pub fn inject_conflicts(&self, count: u32) {
        self.conflicts.store(count, Ordering::SeqCst);
    }

    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStoreTrait for InMemoryOrderStore {
    async fn find_orders_needing_notification(&self) -> Result<Vec<Order>, RepositoryError> {
        self.check_available()?;

        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .await
            .values()
            .filter(|order| order.needs_notification())
            .cloned()
            .collect();
        orders.sort_by_key(|order| (order.created_at, order.order_id));

        Ok(orders)
    }

    async fn find_order_by_id(&self, id: i32) -> Result<Option<Order>, RepositoryError> {
        self.check_available()?;
        Ok(self.orders.lock().await.get(&id).cloned())
    }

    async fn save_order(&self, order: &mut Order) -> Result<(), RepositoryError> {
        self.check_available()?;

        let mut orders = self.orders.lock().await;
        let stored = orders.get_mut(&order.order_id).ok_or(RepositoryError::NotFound)?;

        let injected = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            stored.version += 1;
        }

        if stored.version != order.version {
            return Err(RepositoryError::Conflict(format!(
                "order {} was modified concurrently",
                order.order_number
            )));
        }

        order.version += 1;
        *stored = order.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub wholesaler_email: String,
    pub order_data: OrderData,
}

/// Transport double that records every call and fails for selected
/// addresses.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    failures: Mutex<HashMap<String, TransportError>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, email: &str, error: TransportError) {
        self.failures.lock().unwrap().insert(email.to_string(), error);
    }

    pub fn succeed_for(&self, email: &str) {
        self.failures.lock().unwrap().remove(email);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls_to(&self, email: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.wholesaler_email == email)
            .count()
    }
}

#[async_trait]
impl NotificationTransportTrait for RecordingTransport {
    async fn send(
        &self,
        wholesaler_email: &str,
        order_data: &OrderData,
    ) -> Result<NotificationReceipt, TransportError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let call = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(SentMessage {
                wholesaler_email: wholesaler_email.to_string(),
                order_data: order_data.clone(),
            });
            sent.len()
        };

        if let Some(error) = self.failures.lock().unwrap().get(wholesaler_email) {
            return Err(error.clone());
        }

        Ok(NotificationReceipt {
            message_id: Some(format!("<msg-{call}@test.local>")),
        })
    }
}

pub fn item(id: i32, wholesaler_email: &str, product_name: Option<&str>) -> OrderItem {
    OrderItem {
        order_item_id: id,
        product_id: product_name.map(|_| id),
        product_name: product_name.map(str::to_string),
        quantity: 2,
        price: 1_250,
        wholesaler: WholesalerNotification::new(
            format!("Wholesaler for {wholesaler_email}"),
            wholesaler_email,
            format!("SKU-{id}"),
        ),
    }
}

pub fn notified_item(id: i32, wholesaler_email: &str) -> OrderItem {
    let mut item = item(id, wholesaler_email, Some("Rose quartz"));
    item.wholesaler.mark_notified(Utc::now());
    item
}

pub fn paid_order(order_id: i32, items: Vec<OrderItem>) -> Order {
    order_created_at(order_id, items, Utc::now() - TimeDelta::hours(1))
}

pub fn order_created_at(order_id: i32, items: Vec<OrderItem>, created_at: DateTime<Utc>) -> Order {
    Order {
        order_id,
        order_number: format!("ORD-{order_id:04}"),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Paid,
        shipping_address: ShippingAddress {
            name: "Iris de Vries".into(),
            street: "Lindenlaan 4".into(),
            postal_code: "3511 AB".into(),
            city: "Utrecht".into(),
            country: "NL".into(),
        },
        notes: Some("Please pack carefully".into()),
        items,
        version: 0,
        created_at,
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        backoff_factor: 2.0,
    }
}

pub struct Harness {
    pub store: Arc<InMemoryOrderStore>,
    pub transport: Arc<RecordingTransport>,
    pub deps: DependenciesInject,
    pub service: DynWholesalerNotificationService,
}

pub fn harness(orders: Vec<Order>) -> Harness {
    harness_with_breaker(orders, CircuitBreakerConfig::default())
}

pub fn harness_with_breaker(orders: Vec<Order>, breaker: CircuitBreakerConfig) -> Harness {
    let store = InMemoryOrderStore::with_orders(orders);
    let transport = RecordingTransport::new();

    let mut registry = Registry::default();
    let deps = DependenciesInject::new(
        DependenciesInjectDeps {
            store: store.clone() as DynOrderStore,
            transport: transport.clone() as DynNotificationTransport,
            breaker,
            retry: fast_retry(),
        },
        &mut registry,
    );

    Harness {
        store,
        transport,
        service: deps.notification_service.clone(),
        deps,
    }
}
