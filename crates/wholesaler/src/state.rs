use crate::{
    abstract_trait::{DynNotificationTransport, DynOrderStore},
    config::Config,
    di::{DependenciesInject, DependenciesInjectDeps},
    repository::OrderRepository,
    transport::SmtpNotificationTransport,
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::config::ConnectionPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
}

impl AppState {
    pub fn new(pool: ConnectionPool, config: &Config) -> Result<Self> {
        let store = Arc::new(OrderRepository::new(pool)) as DynOrderStore;

        let transport = Arc::new(
            SmtpNotificationTransport::new(&config.email)
                .context("Failed to initialize SMTP transport")?,
        ) as DynNotificationTransport;

        info!(
            "📮 SMTP relay {}:{} configured",
            config.email.smtp_server, config.email.smtp_port
        );

        Ok(Self::with_parts(
            DependenciesInjectDeps {
                store,
                transport,
                breaker: config.notification.breaker.clone(),
                retry: config.notification.retry.clone(),
            },
        ))
    }

    pub fn with_parts(deps: DependenciesInjectDeps) -> Self {
        let mut registry = Registry::default();
        let di_container = DependenciesInject::new(deps, &mut registry);

        Self {
            di_container,
            registry: Arc::new(Mutex::new(registry)),
        }
    }
}
