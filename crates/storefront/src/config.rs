//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MADRONA_DATABASE_URL` - `PostgreSQL` connection string
//! - `MADRONA_BASE_URL` - Public URL for the storefront
//! - `MADRONA_SESSION_SECRET` - Session signing secret (min 32 chars)
//!
//! ## Optional
//! - `MADRONA_HOST` - Bind address (default: 127.0.0.1)
//! - `MADRONA_PORT` - Listen port (default: 3000)
//! - `MADRONA_TAX_RATE` - Flat invoice tax rate (default: 0.10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Default flat tax rate applied to invoices (10%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Flat tax rate applied when generating invoices
    pub tax_rate: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value
    /// fails to parse, or the session secret is too weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(required("MADRONA_DATABASE_URL")?);
        let base_url = required("MADRONA_BASE_URL")?;

        // Reject obviously malformed base URLs early
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MADRONA_BASE_URL".to_owned(), e.to_string())
        })?;

        let session_secret = required("MADRONA_SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LENGTH {
            return Err(ConfigError::InsecureSecret(
                "MADRONA_SESSION_SECRET".to_owned(),
                format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
            ));
        }

        let host: IpAddr = optional("MADRONA_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidEnvVar("MADRONA_HOST".to_owned(), e.to_string())
            })?;

        let port: u16 = optional("MADRONA_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("MADRONA_PORT".to_owned(), e.to_string())
            })?;

        let tax_rate = match optional("MADRONA_TAX_RATE") {
            Some(raw) => raw.parse::<Decimal>().map_err(|e| {
                ConfigError::InvalidEnvVar("MADRONA_TAX_RATE".to_owned(), e.to_string())
            })?,
            None => DEFAULT_TAX_RATE,
        };
        if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "MADRONA_TAX_RATE".to_owned(),
                format!("rate {tax_rate} must be in [0, 1)"),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret: SecretString::from(session_secret),
            tax_rate,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS (controls cookie flags).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn default_tax_rate_is_ten_percent() {
        assert_eq!(DEFAULT_TAX_RATE, "0.10".parse::<Decimal>().expect("decimal"));
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/madrona"),
            host: "0.0.0.0".parse().expect("ip"),
            port: 8080,
            base_url: "http://localhost:8080".to_owned(),
            session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
            tax_rate: DEFAULT_TAX_RATE,
            sentry_dsn: None,
            sentry_environment: None,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(!config.is_secure());
        // the secret must not leak through Debug
        let debug = format!("{config:?}");
        assert!(!debug.contains("0123456789abcdef"));
        let _ = config.session_secret.expose_secret();
    }
}
