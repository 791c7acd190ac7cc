use std::path::PathBuf;

use fleetdocs_core::types::DbId;
use fleetdocs_core::upload::MAX_UPLOAD_BYTES;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory where document attachments are stored.
    pub upload_dir: PathBuf,
    /// Largest accepted attachment, in bytes.
    pub upload_max_bytes: u64,
    /// Seconds between background reconciliation passes. `0` disables the job.
    pub reconcile_interval_secs: u64,
    /// Tenant that owns document types and subject lookups.
    pub default_client_id: DbId,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                       |
    /// | `UPLOAD_DIR`              | `storage/documents`        |
    /// | `UPLOAD_MAX_BYTES`        | `10485760`                 |
    /// | `RECONCILE_INTERVAL_SECS` | `86400` (`0` disables)     |
    /// | `DEFAULT_CLIENT_ID`       | `1`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "storage/documents".into()),
        );

        let upload_max_bytes: u64 = std::env::var("UPLOAD_MAX_BYTES")
            .map(|v| v.parse().expect("UPLOAD_MAX_BYTES must be a valid u64"))
            .unwrap_or(MAX_UPLOAD_BYTES);

        let reconcile_interval_secs: u64 = std::env::var("RECONCILE_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".into())
            .parse()
            .expect("RECONCILE_INTERVAL_SECS must be a valid u64");

        let default_client_id: DbId = std::env::var("DEFAULT_CLIENT_ID")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("DEFAULT_CLIENT_ID must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            upload_max_bytes,
            reconcile_interval_secs,
            default_client_id,
        }
    }
}
