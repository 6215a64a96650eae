mod lease;
mod notification;
mod recovery;

pub use self::lease::{OrderLease, OrderLeases};
pub use self::notification::{
    NO_PENDING_NOTIFICATIONS, ORDER_NOT_ELIGIBLE, ORDER_NOT_FOUND, WholesalerNotificationService,
    WholesalerNotificationServiceDeps,
};
pub use self::recovery::{NOTIFICATION_BREAKER_NAME, WholesalerErrorRecovery};
