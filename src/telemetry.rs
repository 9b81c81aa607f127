//! Logging setup

use std::env;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Human,
    Json,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Primary log filter (RUST_LOG env var)
    pub log_filter: String,
    /// Fallback log level if RUST_LOG not set
    pub default_level: String,
    pub log_format: LogFormat,
}

impl TelemetryConfig {
    pub fn with_server_config(server_config: &ServerConfig) -> Self {
        Self {
            log_filter: env::var("RUST_LOG").unwrap_or_default(),
            default_level: server_config.log_level.clone(),
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Human,
            },
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.log_filter.is_empty() {
            EnvFilter::new(&self.default_level)
        } else {
            EnvFilter::new(&self.log_filter)
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &TelemetryConfig) {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("tracing subscriber already initialized, skipping");
        return;
    }

    let builder = tracing_subscriber::fmt().with_env_filter(config.filter());
    let result = match config.log_format {
        LogFormat::Json => builder.json().finish().try_init(),
        LogFormat::Human => builder.finish().try_init(),
    };

    if let Err(err) = result {
        eprintln!("failed to initialize logging: {err}");
    }
}
