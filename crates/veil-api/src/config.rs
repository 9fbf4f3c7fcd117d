//! Server configuration, loaded from environment variables.

use std::net::SocketAddr;

use crate::error::AppError;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Login name that grants the administrator role.
    pub admin_key: String,
    /// HMAC key for session cookies.
    pub session_secret: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Database pool size.
    pub database_max_connections: u32,
    /// OTLP collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| AppError::Config(format!("{name} must be set")))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            admin_key: required("ADMIN_KEY")?,
            session_secret: required("SESSION_SECRET")?,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(optional("PORT"), "PORT", 3000)?,
            database_max_connections: parse_or(
                optional("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                10,
            )?,
            otlp_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn bind_address(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} must be a valid number: {e}"))),
    }
}
