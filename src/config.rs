//! Runtime configuration

use std::time::Duration;

use clap::Parser;

use crate::utils::RetryConfig;

/// Cart/order service configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "cart-orders", about = "Cart and order aggregate service", long_about = None)]
pub struct AppConfig {
    /// `PostgreSQL` connection string; in-memory storage when absent
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Connection pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    pub database_max_connections: u32,

    /// Port for the /metrics and /health endpoints
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    pub metrics_port: u16,

    /// Serve Prometheus metrics
    #[arg(long, env = "METRICS_ENABLED", default_value = "true", action = clap::ArgAction::Set)]
    pub metrics_enabled: bool,

    /// Log filter directives
    #[arg(short, long, env = "RUST_LOG", default_value = "info,cart_orders=debug")]
    pub log_level: String,

    /// Attempts per collaborator lookup, including the first
    #[arg(long, env = "LOOKUP_MAX_ATTEMPTS", default_value = "3")]
    pub lookup_max_attempts: u32,

    #[arg(long, env = "LOOKUP_INITIAL_DELAY_MS", default_value = "50")]
    pub lookup_initial_delay_ms: u64,

    #[arg(long, env = "LOOKUP_MAX_DELAY_MS", default_value = "2000")]
    pub lookup_max_delay_ms: u64,
}

impl AppConfig {
    /// Load configuration from `.env`, the environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.lookup_max_attempts.max(1),
            initial_delay: Duration::from_millis(self.lookup_initial_delay_ms),
            max_delay: Duration::from_millis(self.lookup_max_delay_ms),
            ..RetryConfig::default()
        }
    }
}
