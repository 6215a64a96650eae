mod database;
mod email;

pub use self::database::{ConnectionManager, ConnectionPool};
pub use self::email::EmailConfig;
