mod email;
mod template;

pub use self::email::SmtpNotificationTransport;
pub use self::template::render_order_email;
