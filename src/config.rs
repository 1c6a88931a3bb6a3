use anyhow::{Context, Result};
use std::env;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: String,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// How long a one-time code stays valid, in minutes.
    pub otp_ttl_minutes: i64,
    /// Minimum seconds between form render and submission before a
    /// registration is treated as automated.
    pub min_form_dwell_secs: i64,
    /// Interval between runs of the expired-pending-user cleanup, in seconds.
    pub cleanup_interval_secs: u64,
    /// Base URL used to build the verification link in the email.
    pub verify_base_url: String,
    /// Whether cookies get the `Secure` flag (`APP_ENV=production`).
    pub production: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            session_duration_days: env::var("SESSION_DURATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_DURATION_DAYS")?,
            otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid OTP_TTL_MINUTES")?,
            min_form_dwell_secs: env::var("MIN_FORM_DWELL_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("Invalid MIN_FORM_DWELL_SECS")?,
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("Invalid CLEANUP_INTERVAL_SECS")?,
            verify_base_url: env::var("VERIFY_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string()),
            production: env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        })
    }
}
