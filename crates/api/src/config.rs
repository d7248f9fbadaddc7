use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lifetime of a share record in hours (default: `168`).
    pub share_ttl_hours: i64,
    /// How often expired shares are purged, in seconds (default: `3600`).
    pub share_sweep_interval_secs: u64,
    /// Maximum request body size in bytes (default: 50 MiB).
    pub max_body_bytes: usize,
    /// Origin that share links point at (default: `http://localhost:3000`).
    pub public_base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `SHARE_TTL_HOURS`           | `168`                   |
    /// | `SHARE_SWEEP_INTERVAL_SECS` | `3600`                  |
    /// | `MAX_BODY_BYTES`            | `52428800`              |
    /// | `PUBLIC_BASE_URL`           | `http://localhost:3000` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let share_ttl_hours: i64 = std::env::var("SHARE_TTL_HOURS")
            .unwrap_or_else(|_| "168".into())
            .parse()
            .expect("SHARE_TTL_HOURS must be a valid i64");
        assert!(share_ttl_hours > 0, "SHARE_TTL_HOURS must be positive");

        let share_sweep_interval_secs: u64 = std::env::var("SHARE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SHARE_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            share_sweep_interval_secs > 0,
            "SHARE_SWEEP_INTERVAL_SECS must be positive"
        );

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| "52428800".into())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
            share_ttl_hours,
            share_sweep_interval_secs,
            max_body_bytes,
            public_base_url,
        }
    }

    pub fn share_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.share_ttl_hours)
    }

    pub fn share_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.share_sweep_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
