use crate::{
    abstract_trait::{
        DynFailureClassifier, DynNotificationTransport, DynOrderStore,
        WholesalerNotificationServiceTrait,
    },
    domain::{
        recovery::NotificationContext,
        requests::OrderData,
        response::{
            NotificationResult, OrderNotificationOutcome, OrderWholesalerStatus,
            PendingOrdersResponse, SweepSummary,
        },
    },
    metrics::{NotificationMetrics, Outcome},
    model::Order,
    service::{lease::OrderLeases, recovery::WholesalerErrorRecovery},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::{RepositoryError, ServiceError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub const ORDER_NOT_FOUND: &str = "Order not found";
pub const ORDER_NOT_ELIGIBLE: &str =
    "Order must be paid or processing to send wholesaler notifications";
pub const NO_PENDING_NOTIFICATIONS: &str = "No pending wholesaler notifications for this order";

const MAX_SAVE_ATTEMPTS: u32 = 3;

// What happened to one wholesaler group, replayable onto a freshly loaded
// copy of the order when the save hits a version conflict.
enum GroupOutcome {
    Delivered { email: String, at: DateTime<Utc> },
    Failed { email: String, error: String },
    Skipped { email: String, error: String },
}

impl GroupOutcome {
    fn apply(&self, order: &mut Order) -> usize {
        match self {
            GroupOutcome::Delivered { email, at } => order.mark_group_notified(email, *at),
            GroupOutcome::Failed { email, error } => order.record_group_failure(email, error),
            GroupOutcome::Skipped { email, error } => order.record_group_skipped(email, error),
        }
    }
}

#[derive(Clone)]
pub struct WholesalerNotificationService {
    store: DynOrderStore,
    transport: DynNotificationTransport,
    recovery: Arc<WholesalerErrorRecovery>,
    classifier: DynFailureClassifier,
    leases: OrderLeases,
    metrics: Arc<NotificationMetrics>,
}

pub struct WholesalerNotificationServiceDeps {
    pub store: DynOrderStore,
    pub transport: DynNotificationTransport,
    pub recovery: Arc<WholesalerErrorRecovery>,
    pub classifier: DynFailureClassifier,
    pub leases: OrderLeases,
    pub metrics: Arc<NotificationMetrics>,
}

impl WholesalerNotificationService {
    pub fn new(deps: WholesalerNotificationServiceDeps) -> Self {
        let WholesalerNotificationServiceDeps {
            store,
            transport,
            recovery,
            classifier,
            leases,
            metrics,
        } = deps;

        Self {
            store,
            transport,
            recovery,
            classifier,
            leases,
            metrics,
        }
    }

    /// Sends one message per pending wholesaler group and applies the
    /// outcome to the in-memory order. Send failures never escape.
    async fn notify_order(&self, order: &mut Order) -> (Vec<NotificationResult>, Vec<GroupOutcome>) {
        let groups = order.pending_wholesaler_groups();
        let mut results = Vec::with_capacity(groups.len());
        let mut outcomes = Vec::with_capacity(groups.len());

        for group in groups {
            let email = group.wholesaler_email.as_str();
            let order_data = OrderData::for_group(order, &group);
            let label = format!("wholesaler notification {} -> {email}", order.order_number);

            let transport = &self.transport;
            let payload = &order_data;

            info!(
                order_number = %order.order_number,
                wholesaler_email = email,
                items = group.items.len(),
                "📧 Sending wholesaler notification"
            );

            let outcome = match self
                .recovery
                .send_notification(&label, move || transport.send(email, payload))
                .await
            {
                Ok(receipt) => {
                    let at = Utc::now();
                    info!(
                        order_number = %order.order_number,
                        wholesaler_email = email,
                        message_id = receipt.message_id.as_deref().unwrap_or("-"),
                        "✅ Wholesaler notified"
                    );
                    self.metrics.record_notification(Outcome::Success);
                    results.push(NotificationResult::success(
                        &order.order_number,
                        email,
                        receipt.message_id,
                    ));
                    GroupOutcome::Delivered {
                        email: email.to_string(),
                        at,
                    }
                }
                Err(err) => {
                    let short_circuited = err.is_open();
                    let message = err.to_string();
                    error!(
                        order_number = %order.order_number,
                        wholesaler_email = email,
                        error = %message,
                        "❌ Wholesaler notification failed"
                    );

                    let action = self.classifier.classify(
                        &message,
                        &NotificationContext {
                            order_number: &order.order_number,
                            wholesaler_email: email,
                        },
                    );

                    self.metrics.record_notification(Outcome::Error);
                    results.push(NotificationResult::error(
                        &order.order_number,
                        email,
                        message.clone(),
                        Some(action),
                    ));
                    // the breaker refused the call, nothing was sent
                    if short_circuited {
                        GroupOutcome::Skipped {
                            email: email.to_string(),
                            error: message,
                        }
                    } else {
                        GroupOutcome::Failed {
                            email: email.to_string(),
                            error: message,
                        }
                    }
                }
            };

            outcome.apply(order);
            outcomes.push(outcome);
        }

        (results, outcomes)
    }

    /// Saves the order; on a version conflict the outcomes are replayed
    /// onto the latest stored copy and the save is retried.
    async fn persist(&self, order: &mut Order, outcomes: &[GroupOutcome]) -> Result<(), ServiceError> {
        if outcomes.is_empty() {
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            match self.store.save_order(order).await {
                Ok(()) => return Ok(()),
                Err(RepositoryError::Conflict(reason)) if attempt < MAX_SAVE_ATTEMPTS => {
                    warn!(
                        order_number = %order.order_number,
                        attempt,
                        reason = %reason,
                        "Order changed concurrently, reapplying notification state"
                    );

                    let mut latest = self
                        .store
                        .find_order_by_id(order.order_id)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;

                    for outcome in outcomes {
                        outcome.apply(&mut latest);
                    }

                    *order = latest;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        order_number = %order.order_number,
                        error = %err,
                        "❌ Failed to persist wholesaler notification state"
                    );
                    return Err(err.into());
                }
            }
        }
    }

    async fn refresh_breaker_gauge(&self) {
        let state = self.recovery.circuit_breaker().state().await;
        self.metrics.set_circuit_state(state);
    }
}

#[async_trait]
impl WholesalerNotificationServiceTrait for WholesalerNotificationService {
    async fn process_pending_notifications(&self) -> Result<SweepSummary, ServiceError> {
        let started = Instant::now();
        info!("🔍 Looking for orders with pending wholesaler notifications");

        let mut orders = self
            .store
            .find_orders_needing_notification()
            .await
            .map_err(|err| {
                error!("❌ Failed to query orders needing notification: {err}");
                ServiceError::from(err)
            })?;

        orders.retain(Order::needs_notification);

        if orders.is_empty() {
            info!("No orders need wholesaler notification");
            self.metrics.record_sweep(started.elapsed());
            return Ok(SweepSummary::default());
        }

        let processed = orders.len();
        let mut results = Vec::new();

        for candidate in orders {
            let Some(_lease) = self.leases.try_acquire(candidate.order_id) else {
                warn!(
                    order_number = %candidate.order_number,
                    "Order is being processed elsewhere, skipping in this sweep"
                );
                continue;
            };

            // another run may have finished this order since the sweep query
            let mut order = match self.store.find_order_by_id(candidate.order_id).await {
                Ok(Some(order)) if order.needs_notification() => order,
                Ok(_) => {
                    info!(
                        order_number = %candidate.order_number,
                        "Order no longer needs wholesaler notification, skipping"
                    );
                    continue;
                }
                Err(err) => {
                    error!(
                        order_number = %candidate.order_number,
                        error = %err,
                        "❌ Failed to reload order, skipping in this sweep"
                    );
                    continue;
                }
            };

            let (mut order_results, outcomes) = self.notify_order(&mut order).await;

            if let Err(err) = self.persist(&mut order, &outcomes).await {
                let reason = format!("Notification state not saved: {err}");
                for result in order_results.iter_mut().filter(|r| r.is_success()) {
                    result.mark_unsaved(reason.clone());
                }
            }

            results.extend(order_results);
        }

        self.metrics.record_sweep(started.elapsed());
        self.refresh_breaker_gauge().await;

        let summary = SweepSummary::new(processed, results);
        info!(
            processed = summary.processed,
            success_count = summary.success_count,
            error_count = summary.error_count,
            "✅ Wholesaler notification sweep finished"
        );

        Ok(summary)
    }

    async fn process_order_notifications(
        &self,
        order_id: i32,
    ) -> Result<OrderNotificationOutcome, ServiceError> {
        let _lease = self.leases.try_acquire(order_id).ok_or_else(|| {
            ServiceError::Conflict(format!("Order {order_id} is already being processed"))
        })?;

        let mut order = self
            .store
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;

        if !order.is_eligible_for_notification() {
            return Err(ServiceError::InvalidState(ORDER_NOT_ELIGIBLE.to_string()));
        }

        if !order.has_pending_notifications() {
            info!(order_number = %order.order_number, "{NO_PENDING_NOTIFICATIONS}");
            return Ok(OrderNotificationOutcome {
                order_number: order.order_number,
                results: Vec::new(),
                message: Some(NO_PENDING_NOTIFICATIONS.to_string()),
            });
        }

        let (results, outcomes) = self.notify_order(&mut order).await;
        self.persist(&mut order, &outcomes).await?;
        self.refresh_breaker_gauge().await;

        Ok(OrderNotificationOutcome {
            order_number: order.order_number,
            results,
            message: None,
        })
    }

    async fn find_pending(&self) -> Result<PendingOrdersResponse, ServiceError> {
        let mut orders = self.store.find_orders_needing_notification().await?;
        orders.retain(Order::needs_notification);

        Ok(PendingOrdersResponse::from(orders.as_slice()))
    }

    async fn find_order_status(
        &self,
        order_id: i32,
    ) -> Result<OrderWholesalerStatus, ServiceError> {
        let order = self
            .store
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ORDER_NOT_FOUND.to_string()))?;

        Ok(OrderWholesalerStatus::from(&order))
    }
}
