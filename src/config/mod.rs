//! Configuration module for the wedding invitation backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Longest accepted admin session lifetime, in hours.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Email of the single administrator account
    pub admin_email: Option<String>,
    /// Password of the single administrator account
    pub admin_password: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Origin used when building invite links, without trailing slash
    pub public_base_url: String,
    /// Lifetime of an admin session in hours
    pub session_ttl_hours: i64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_email = non_empty_var("WEDDING_ADMIN_EMAIL");
        let admin_password = non_empty_var("WEDDING_ADMIN_PASSWORD");

        let db_path = env::var("WEDDING_DB_PATH")
            .unwrap_or_else(|_| "./data/wedding.sqlite".to_string())
            .into();

        let bind_addr = env::var("WEDDING_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid WEDDING_BIND_ADDR format");

        let public_base_url = env::var("WEDDING_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let session_ttl_hours = env::var("WEDDING_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|hours: &i64| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
            .unwrap_or(24);

        let log_level = env::var("WEDDING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            admin_email,
            admin_password,
            db_path,
            bind_addr,
            public_base_url,
            session_ttl_hours,
            log_level,
        }
    }

    /// Whether the admin gate has a configured account.
    pub fn admin_gate_enabled(&self) -> bool {
        self.admin_email.is_some() && self.admin_password.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
