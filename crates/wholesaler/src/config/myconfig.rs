use anyhow::{Context, Result, anyhow};
use shared::{
    config::EmailConfig,
    resilience::{CircuitBreakerConfig, RetryConfig},
};
use std::{fmt::Display, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    /// Interval of the in-process sweeper; `None` leaves sweeping to cron.
    pub sweep_interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub run_migrations: bool,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub email: EmailConfig,
    pub notification: NotificationSettings,
    pub otel_endpoint: Option<String>,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Unable to parse {key}='{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(anyhow!("{key} must be 'true' or 'false', got '{other}'")),
    }
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;

        let port = env_or("PORT", 5000u16)?;

        let run_migrations = match std::env::var("RUN_MIGRATIONS") {
            Ok(raw) => parse_flag("RUN_MIGRATIONS", &raw)?,
            Err(_) => true,
        };

        let db_max_conn = env_or("DB_MAX_CONNECTION", 5u32)?;
        let db_min_conn = env_or("DB_MIN_CONNECTION", 1u32)?;

        let email = EmailConfig::init().context("Failed to load SMTP configuration")?;

        let breaker = CircuitBreakerConfig {
            failure_threshold: env_or("WHOLESALER_CB_FAILURE_THRESHOLD", 5u32)?,
            reset_timeout: Duration::from_millis(env_or("WHOLESALER_CB_RESET_TIMEOUT_MS", 60_000u64)?),
        };

        let retry = RetryConfig {
            max_retries: env_or("WHOLESALER_RETRY_MAX", 3u32)?,
            base_delay: Duration::from_millis(env_or("WHOLESALER_RETRY_BASE_DELAY_MS", 1_000u64)?),
            max_delay: Duration::from_millis(env_or("WHOLESALER_RETRY_MAX_DELAY_MS", 10_000u64)?),
            ..RetryConfig::default()
        };

        let sweep_interval = match std::env::var("WHOLESALER_SWEEP_INTERVAL_SECS") {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .context("WHOLESALER_SWEEP_INTERVAL_SECS must be a valid u64 integer")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let otel_endpoint = std::env::var("OTEL_EXPORTER_ENDPOINT")
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty());

        Ok(Self {
            database_url,
            port,
            run_migrations,
            db_max_conn,
            db_min_conn,
            email,
            notification: NotificationSettings {
                breaker,
                retry,
                sweep_interval,
            },
            otel_endpoint,
        })
    }
}
