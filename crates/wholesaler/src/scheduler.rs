use crate::abstract_trait::DynWholesalerNotificationService;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

/// Runs a sweep every `every`. Sweeps run one after another inside this
/// task, so they never overlap with each other.
pub async fn run_notification_sweeper(service: DynWholesalerNotificationService, every: Duration) {
    info!("⏰ Wholesaler notification sweeper running every {:?}", every);

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match service.process_pending_notifications().await {
            Ok(summary) => info!(
                processed = summary.processed,
                success_count = summary.success_count,
                error_count = summary.error_count,
                "Scheduled wholesaler sweep completed"
            ),
            Err(e) => error!("❌ Scheduled wholesaler sweep failed: {e}"),
        }
    }
}
