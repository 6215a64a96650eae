use crate::{
    abstract_trait::{
        DynFailureClassifier, DynNotificationTransport, DynOrderStore,
        DynWholesalerNotificationService,
    },
    metrics::NotificationMetrics,
    service::{
        OrderLeases, WholesalerErrorRecovery, WholesalerNotificationService,
        WholesalerNotificationServiceDeps,
    },
};
use prometheus_client::registry::Registry;
use shared::resilience::{CircuitBreakerConfig, RetryConfig};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct DependenciesInject {
    pub notification_service: DynWholesalerNotificationService,
    pub recovery: Arc<WholesalerErrorRecovery>,
    pub metrics: Arc<NotificationMetrics>,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("notification_service", &"WholesalerNotificationService")
            .field("recovery", &"WholesalerErrorRecovery")
            .field("metrics", &self.metrics)
            .finish()
    }
}

pub struct DependenciesInjectDeps {
    pub store: DynOrderStore,
    pub transport: DynNotificationTransport,
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            store,
            transport,
            breaker,
            retry,
        } = deps;

        let recovery = Arc::new(WholesalerErrorRecovery::new(breaker, retry));
        let classifier: DynFailureClassifier = recovery.clone();

        let metrics = Arc::new(NotificationMetrics::new());
        metrics.register(registry);

        let service = WholesalerNotificationService::new(WholesalerNotificationServiceDeps {
            store,
            transport,
            recovery: recovery.clone(),
            classifier,
            leases: OrderLeases::new(),
            metrics: metrics.clone(),
        });

        Self {
            notification_service: Arc::new(service) as DynWholesalerNotificationService,
            recovery,
            metrics,
        }
    }
}
