use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub is_dev: bool,
    pub enable_file: bool,
}

impl LogOptions {
    pub fn from_env() -> Self {
        let is_dev = std::env::var("DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let enable_file = std::env::var("ENABLE_FILE_LOG")
            .map(|v| v == "true")
            .unwrap_or(false);

        Self { is_dev, enable_file }
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer and must be held for the lifetime of the process.
pub fn init_logger(
    logger_provider: Option<&SdkLoggerProvider>,
    component: &str,
    options: LogOptions,
) -> Option<WorkerGuard> {
    let default_level = if options.is_dev { "debug" } else { "info" };

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_ansi(options.is_dev)
        .with_filter(console_filter);

    let (file_layer, guard) = if options.enable_file {
        let log_dir = if options.is_dev { "./logs" } else { "/var/log/app" };
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, format!("{component}.log"));
        let (writer, guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .with_filter(EnvFilter::new("info"));

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let otel_layer = logger_provider.map(|provider| {
        OpenTelemetryTracingBridge::new(provider).with_filter(EnvFilter::new(
            "info,hyper=off,h2=off,tonic=off,opentelemetry=off,sqlx=warn",
        ))
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(otel_layer)
        .init();

    guard
}
