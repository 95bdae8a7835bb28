//! Runtime configuration.
//!
//! Everything comes from `IOT_*` environment variables with defaults; a
//! missing database path is a supported configuration, not an error.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file. Absent means the backend runs
    /// without a store and serves the built-in sample data.
    pub db_path: Option<PathBuf>,
    /// Maximum number of pooled store connections
    pub db_max_connections: u32,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("IOT_DB_PATH").ok().map(PathBuf::from);

        let db_max_connections = env::var("IOT_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let bind_addr = env::var("IOT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .expect("Invalid IOT_BIND_ADDR format");

        let log_level = env::var("IOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            db_max_connections,
            bind_addr,
            log_level,
        }
    }
}
