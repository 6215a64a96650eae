mod notification;

pub use self::notification::{NotificationItem, OrderData, format_cents};
