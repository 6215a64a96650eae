mod api;
mod notification;
mod status;

pub use self::api::ApiResponse;
pub use self::notification::{
    NotificationResult, NotificationStatus, OrderNotificationOutcome, SweepSummary,
};
pub use self::status::{
    OrderWholesalerStatus, PendingOrder, PendingOrdersResponse, PendingWholesaler,
    WholesalerStatusEntry,
};
