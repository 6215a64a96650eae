mod datetime;
mod gracefullshutdown;
mod logs;
mod otel;

pub use self::datetime::format_order_date;
pub use self::gracefullshutdown::shutdown_signal;
pub use self::logs::{LogOptions, init_logger};
pub use self::otel::Telemetry;
