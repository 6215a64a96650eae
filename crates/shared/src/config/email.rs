use anyhow::{Context, Result};

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SENDER: &str = "orders@holistic-shop.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub from_address: String,
}

impl EmailConfig {
    pub fn init() -> Result<Self> {
        let smtp_user =
            std::env::var("SMTP_USERNAME").context("Missing environment variable: SMTP_USERNAME")?;
        let smtp_pass =
            std::env::var("SMTP_PASSWORD").context("Missing environment variable: SMTP_PASSWORD")?;
        let smtp_server =
            std::env::var("SMTP_HOST").context("Missing environment variable: SMTP_HOST")?;

        let smtp_port = match std::env::var("SMTP_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .context("SMTP_PORT must be a valid u16 integer")?,
            Err(_) => DEFAULT_SMTP_PORT,
        };

        let from_address =
            std::env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_SENDER.to_string());

        Ok(Self {
            smtp_server,
            smtp_port,
            smtp_user,
            smtp_pass,
            from_address,
        })
    }
}
