use prometheus_client::metrics::{
    counter::Counter, family::Family, gauge::Gauge, histogram::Histogram,
};
use prometheus_client::registry::Registry;
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};
use shared::resilience::CircuitState;
use std::time::Duration;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: Outcome,
}

#[derive(Clone, Debug)]
pub struct NotificationMetrics {
    notifications: Family<OutcomeLabels, Counter>,
    sweeps: Counter,
    sweep_duration: Histogram,
    circuit_state: Gauge,
}

impl Default for NotificationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationMetrics {
    pub fn new() -> Self {
        Self {
            notifications: Family::default(),
            sweeps: Counter::default(),
            sweep_duration: Histogram::new(
                [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0].into_iter(),
            ),
            circuit_state: Gauge::default(),
        }
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "wholesaler_notifications",
            "Wholesaler notification sends by outcome",
            self.notifications.clone(),
        );
        registry.register(
            "wholesaler_sweeps",
            "Completed pending-notification sweeps",
            self.sweeps.clone(),
        );
        registry.register(
            "wholesaler_sweep_duration_seconds",
            "Duration of pending-notification sweeps",
            self.sweep_duration.clone(),
        );
        registry.register(
            "wholesaler_circuit_breaker_state",
            "Notification circuit breaker state (0 closed, 1 open, 2 half-open)",
            self.circuit_state.clone(),
        );
    }

    pub fn record_notification(&self, outcome: Outcome) {
        self.notifications
            .get_or_create(&OutcomeLabels { outcome })
            .inc();
    }

    pub fn record_sweep(&self, elapsed: Duration) {
        self.sweeps.inc();
        self.sweep_duration.observe(elapsed.as_secs_f64());
    }

    pub fn set_circuit_state(&self, state: CircuitState) {
        self.circuit_state.set(state.as_gauge());
    }

    pub fn notification_count(&self, outcome: Outcome) -> u64 {
        self.notifications
            .get_or_create(&OutcomeLabels { outcome })
            .get()
    }
}
