//! Service configuration loaded from environment variables.

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `METRICS_PORT` — Prometheus scrape port (default: `9090`)
/// - `STUCK_SAGA_DEADLINE_SECS` — how long a saga may wait on an outcome
///   event before it is flagged as stuck (default: `300`)
/// - `STUCK_SAGA_SCAN_SECS` — monitor scan interval (default: `60`)
/// - `RETRY_MAX_ATTEMPTS` — optimistic write / publish retry bound
///   (default: `3`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub metrics_port: u16,
    pub stuck_saga_deadline_secs: u64,
    pub stuck_saga_scan_secs: u64,
    pub retry_max_attempts: u32,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_parsed("METRICS_PORT", 9090),
            stuck_saga_deadline_secs: env_parsed("STUCK_SAGA_DEADLINE_SECS", 300),
            stuck_saga_scan_secs: env_parsed("STUCK_SAGA_SCAN_SECS", 60),
            retry_max_attempts: env_parsed("RETRY_MAX_ATTEMPTS", 3),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the metrics bind address.
    pub fn metrics_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            stuck_saga_deadline_secs: 300,
            stuck_saga_scan_secs: 60,
            retry_max_attempts: 3,
            log_level: "info".to_string(),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
