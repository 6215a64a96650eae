mod common;

use chrono::{TimeDelta, Utc};
use common::{
    W1, W2, harness, harness_with_breaker, item, notified_item, order_created_at, paid_order,
};
use shared::errors::{RepositoryError, ServiceError};
use shared::resilience::{CircuitBreakerConfig, CircuitState};
use std::time::Duration;
use wholesaler::{
    abstract_trait::TransportError,
    domain::{recovery::RecoveryAction, response::NotificationStatus},
    metrics::Outcome,
    model::{OrderStatus, PaymentStatus, UNKNOWN_PRODUCT},
    service::{NO_PENDING_NOTIFICATIONS, ORDER_NOT_ELIGIBLE, ORDER_NOT_FOUND},
};

#[tokio::test]
async fn notifies_every_wholesaler_of_a_paid_order() {
    let h = harness(vec![paid_order(
        1,
        vec![item(1, W1, Some("White sage")), item(2, W2, Some("Amethyst"))],
    )]);

    let outcome = h.service.process_order_notifications(1).await.unwrap();

    assert_eq!(outcome.order_number, "ORD-0001");
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|result| result.is_success()));
    assert_eq!(outcome.results[0].wholesaler_email, W1);
    assert_eq!(outcome.results[1].wholesaler_email, W2);
    assert!(outcome.results[0].message_id.is_some());
    assert!(outcome.message.is_none());

    let stored = h.store.order(1).await;
    for item in &stored.items {
        assert!(item.wholesaler.notified());
        assert!(item.wholesaler.notified_at().is_some());
        assert!(item.wholesaler.last_notification_error().is_none());
    }
    assert_eq!(h.store.saves(), 1);
}

#[tokio::test]
async fn failed_wholesaler_is_the_only_one_retried() {
    let h = harness(vec![paid_order(
        1,
        vec![item(1, W1, Some("White sage")), item(2, W2, Some("Amethyst"))],
    )]);
    h.transport
        .fail_for(W2, TransportError::Network("connection reset".into()));

    let first = h.service.process_order_notifications(1).await.unwrap();

    assert_eq!(first.results.len(), 2);
    assert_eq!(first.results[0].status, NotificationStatus::Success);
    assert_eq!(first.results[1].status, NotificationStatus::Error);
    assert!(
        first.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("connection reset")
    );
    assert!(matches!(
        first.results[1].recovery,
        Some(RecoveryAction::QueuedForRetry { .. })
    ));

    let stored = h.store.order(1).await;
    assert!(stored.items[0].wholesaler.notified());
    assert!(!stored.items[1].wholesaler.notified());
    assert!(stored.items[1].wholesaler.notified_at().is_none());
    assert!(stored.items[1].wholesaler.last_notification_error().is_some());

    h.transport.succeed_for(W2);
    let second = h.service.process_order_notifications(1).await.unwrap();

    assert_eq!(second.results.len(), 1);
    assert_eq!(second.results[0].wholesaler_email, W2);
    assert!(second.results[0].is_success());
    assert_eq!(h.transport.calls_to(W1), 1);

    let stored = h.store.order(1).await;
    assert!(stored.items.iter().all(|item| item.wholesaler.notified()));
}

#[tokio::test]
async fn empty_sweep_contacts_nobody() {
    let h = harness(Vec::new());

    let summary = h.service.process_pending_notifications().await.unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.error_count, 0);
    assert!(summary.results.is_empty());
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn one_message_per_wholesaler_with_only_its_items() {
    let h = harness(vec![paid_order(
        1,
        vec![
            item(1, W1, Some("White sage")),
            item(2, W2, Some("Amethyst")),
            item(3, W1, None),
            item(4, "", Some("House blend")),
        ],
    )]);

    h.service.process_order_notifications(1).await.unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0].wholesaler_email, W1);
    let names: Vec<&str> = sent[0]
        .order_data
        .items
        .iter()
        .map(|item| item.product_name.as_str())
        .collect();
    assert_eq!(names, vec!["White sage", UNKNOWN_PRODUCT]);
    assert_eq!(sent[0].order_data.order_number, "ORD-0001");
    assert_eq!(sent[0].order_data.notes.as_deref(), Some("Please pack carefully"));

    assert_eq!(sent[1].wholesaler_email, W2);
    assert_eq!(sent[1].order_data.items.len(), 1);
    assert_eq!(sent[1].order_data.items[0].product_code, "SKU-2");

    let stored = h.store.order(1).await;
    assert!(!stored.items[3].wholesaler.notified());
}

#[tokio::test]
async fn ineligible_orders_are_never_swept() {
    let mut unpaid = paid_order(1, vec![item(1, W1, Some("White sage"))]);
    unpaid.payment_status = PaymentStatus::Pending;
    unpaid.status = OrderStatus::Pending;

    let h = harness(vec![unpaid]);

    let summary = h.service.process_pending_notifications().await.unwrap();
    assert_eq!(summary.processed, 0);
    assert!(h.transport.sent().is_empty());

    let pending = h.service.find_pending().await.unwrap();
    assert_eq!(pending.count, 0);

    let err = h.service.process_order_notifications(1).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(err.to_string(), ORDER_NOT_ELIGIBLE);
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn processing_orders_qualify_without_payment() {
    let mut order = paid_order(1, vec![item(1, W1, Some("White sage"))]);
    order.payment_status = PaymentStatus::Pending;
    order.status = OrderStatus::Processing;

    let h = harness(vec![order]);

    let summary = h.service.process_pending_notifications().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.success_count, 1);
}

#[tokio::test]
async fn sweep_runs_oldest_order_first_and_isolates_failures() {
    let now = Utc::now();
    let h = harness(vec![
        order_created_at(1, vec![item(1, W1, Some("White sage"))], now - TimeDelta::minutes(5)),
        order_created_at(2, vec![item(2, W2, Some("Amethyst"))], now - TimeDelta::hours(2)),
    ]);
    h.transport
        .fail_for(W2, TransportError::Bounced("mailbox unavailable".into()));

    let summary = h.service.process_pending_notifications().await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.results[0].order_number, "ORD-0002");
    assert_eq!(summary.results[0].status, NotificationStatus::Error);
    assert_eq!(
        summary.results[0].recovery,
        Some(RecoveryAction::AlternativeMethodAttempted {
            method: "webhook".into()
        })
    );
    assert_eq!(summary.results[1].order_number, "ORD-0001");
    assert!(summary.results[1].is_success());

    assert!(h.store.order(1).await.items[0].wholesaler.notified());
    assert!(!h.store.order(2).await.items[0].wholesaler.notified());

    assert_eq!(h.deps.metrics.notification_count(Outcome::Success), 1);
    assert_eq!(h.deps.metrics.notification_count(Outcome::Error), 1);
}

#[tokio::test]
async fn sweep_fails_when_orders_cannot_be_queried() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.store.set_unavailable(true);

    let err = h.service.process_pending_notifications().await.unwrap_err();

    assert!(matches!(err, ServiceError::Repo(RepositoryError::Sqlx(_))));
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn unknown_order_is_reported_as_not_found() {
    let h = harness(Vec::new());

    let err = h.service.process_order_notifications(999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.to_string(), ORDER_NOT_FOUND);

    let err = h.service.find_order_status(999).await.unwrap_err();
    assert_eq!(err.to_string(), ORDER_NOT_FOUND);
}

#[tokio::test]
async fn repeated_runs_never_resend() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);

    h.service.process_order_notifications(1).await.unwrap();
    let again = h.service.process_order_notifications(1).await.unwrap();

    assert!(again.results.is_empty());
    assert_eq!(again.message.as_deref(), Some(NO_PENDING_NOTIFICATIONS));

    let summary = h.service.process_pending_notifications().await.unwrap();
    assert_eq!(summary.processed, 0);

    assert_eq!(h.transport.calls_to(W1), 1);
    assert_eq!(h.store.saves(), 1);
}

#[tokio::test]
async fn already_notified_order_reports_nothing_pending() {
    let h = harness(vec![paid_order(1, vec![notified_item(1, W1)])]);

    let outcome = h.service.process_order_notifications(1).await.unwrap();

    assert_eq!(outcome.message.as_deref(), Some(NO_PENDING_NOTIFICATIONS));
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.store.saves(), 0);
}

#[tokio::test]
async fn attempts_count_once_per_run_not_per_retry() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.transport
        .fail_for(W1, TransportError::Timeout("no answer".into()));

    h.service.process_order_notifications(1).await.unwrap();

    // two transport calls from the retry loop, one recorded attempt
    assert_eq!(h.transport.calls_to(W1), 2);
    let record = h.store.order(1).await.items[0].wholesaler.clone();
    assert_eq!(record.notification_attempts(), 1);
    assert!(record.last_notification_error().unwrap().contains("timeout"));

    h.service.process_order_notifications(1).await.unwrap();
    let record = h.store.order(1).await.items[0].wholesaler.clone();
    assert_eq!(record.notification_attempts(), 2);
}

#[tokio::test]
async fn open_breaker_short_circuits_remaining_groups() {
    let h = harness_with_breaker(
        vec![paid_order(
            1,
            vec![item(1, W1, Some("White sage")), item(2, W2, Some("Amethyst"))],
        )],
        CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(60),
        },
    );
    h.transport
        .fail_for(W1, TransportError::Rejected("550 relay denied".into()));

    let outcome = h.service.process_order_notifications(1).await.unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|result| !result.is_success()));
    assert!(
        outcome.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("is OPEN")
    );
    assert!(matches!(
        outcome.results[1].recovery,
        Some(RecoveryAction::Escalated { .. })
    ));
    assert_eq!(h.transport.calls_to(W2), 0);
    assert_eq!(
        h.deps.recovery.circuit_breaker().state().await,
        CircuitState::Open
    );

    let stored = h.store.order(1).await;
    assert_eq!(stored.items[0].wholesaler.notification_attempts(), 1);
    let skipped = &stored.items[1].wholesaler;
    assert_eq!(skipped.notification_attempts(), 0);
    assert!(skipped.last_notification_error().unwrap().contains("is OPEN"));
}

#[tokio::test]
async fn concurrent_runs_for_one_order_are_rejected() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.transport.set_delay(Duration::from_millis(50));

    let (first, second) = tokio::join!(
        h.service.process_order_notifications(1),
        h.service.process_order_notifications(1),
    );

    assert_eq!(first.unwrap().results.len(), 1);
    assert!(matches!(second, Err(ServiceError::Conflict(_))));
    assert_eq!(h.transport.calls_to(W1), 1);
}

#[tokio::test]
async fn sweep_skips_order_held_by_single_run() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.transport.set_delay(Duration::from_millis(50));

    let (single, sweep) = tokio::join!(
        h.service.process_order_notifications(1),
        h.service.process_pending_notifications(),
    );

    assert_eq!(single.unwrap().results.len(), 1);
    assert!(sweep.unwrap().results.is_empty());
    assert_eq!(h.transport.calls_to(W1), 1);
    assert!(h.store.order(1).await.items[0].wholesaler.notified());
}

#[tokio::test]
async fn sweep_does_not_resend_order_finished_by_single_run() {
    const W3: &str = "orders@w3.example.com";

    let now = Utc::now();
    let h = harness(vec![
        order_created_at(
            1,
            vec![item(1, W1, Some("White sage")), item(2, W2, Some("Amethyst"))],
            now - TimeDelta::hours(2),
        ),
        order_created_at(2, vec![item(3, W3, Some("Palo santo"))], now - TimeDelta::hours(1)),
    ]);
    h.transport.set_delay(Duration::from_millis(100));

    let single_run = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.service.process_order_notifications(2).await
    };
    let (sweep, single) = tokio::join!(h.service.process_pending_notifications(), single_run);

    assert_eq!(single.unwrap().results.len(), 1);

    let sweep = sweep.unwrap();
    assert!(sweep.results.iter().all(|r| r.order_number == "ORD-0001"));
    assert_eq!(sweep.success_count, 2);

    assert_eq!(h.transport.calls_to(W3), 1);
    assert!(h.store.order(2).await.items[0].wholesaler.notified());
}

#[tokio::test]
async fn sweep_reports_unsaved_sends_as_errors() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.store.inject_conflicts(3);

    let summary = h.service.process_pending_notifications().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.results[0].status, NotificationStatus::Error);
    assert!(
        summary.results[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Notification state not saved")
    );
    assert!(summary.results[0].message_id.is_some());
    assert!(!h.store.order(1).await.items[0].wholesaler.notified());
}

#[tokio::test]
async fn version_conflict_is_resolved_by_reapplying_outcomes() {
    let h = harness(vec![paid_order(
        1,
        vec![item(1, W1, Some("White sage")), item(2, W2, Some("Amethyst"))],
    )]);
    h.store.inject_conflicts(1);

    let outcome = h.service.process_order_notifications(1).await.unwrap();
    assert_eq!(outcome.results.len(), 2);

    let stored = h.store.order(1).await;
    assert_eq!(stored.version, 2);
    assert!(stored.items.iter().all(|item| item.wholesaler.notified()));
    assert_eq!(h.transport.sent().len(), 2);
}

#[tokio::test]
async fn persistent_conflicts_surface_as_error() {
    let h = harness(vec![paid_order(1, vec![item(1, W1, Some("White sage"))])]);
    h.store.inject_conflicts(3);

    let err = h.service.process_order_notifications(1).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repo(RepositoryError::Conflict(_))
    ));
    assert_eq!(h.store.saves(), 0);
}

#[tokio::test]
async fn status_lists_every_wholesaler_item() {
    let h = harness(vec![paid_order(
        1,
        vec![notified_item(1, W1), item(2, W2, Some("Amethyst"))],
    )]);

    let status = h.service.find_order_status(1).await.unwrap();

    assert_eq!(status.order_number, "ORD-0001");
    assert_eq!(status.wholesalers.len(), 2);
    assert!(status.wholesalers[0].notified);
    assert!(status.wholesalers[0].notified_at.is_some());
    assert!(!status.wholesalers[1].notified);

    let pending = h.service.find_pending().await.unwrap();
    assert_eq!(pending.count, 1);
    assert_eq!(pending.orders[0].pending_wholesalers.len(), 1);
    assert_eq!(pending.orders[0].pending_wholesalers[0].wholesaler_email, W2);
}
