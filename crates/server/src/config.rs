//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FORKFUL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `OIDC_ISSUER_URL` - Identity provider realm URL (e.g. `https://sso.example.com/realms/forkful`)
//!
//! ## Optional
//! - `FORKFUL_HOST` - Bind address (default: 127.0.0.1)
//! - `FORKFUL_PORT` - Listen port (default: 8000)
//! - `CLAIMS_CACHE_TTL_SECS` - How long verified tokens are cached (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Identity provider settings
    pub oidc: OidcConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// OpenID Connect identity provider configuration.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Realm URL; endpoints are resolved relative to it
    pub issuer_url: Url,
    /// Lifetime of a cached token verification
    pub claims_cache_ttl: Duration,
}

impl OidcConfig {
    /// The userinfo endpoint of the realm.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the joined URL is invalid.
    pub fn userinfo_url(&self) -> Result<Url, url::ParseError> {
        let base = self.issuer_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/protocol/openid-connect/userinfo"))
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FORKFUL_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("FORKFUL_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("FORKFUL_PORT", "8000")?;
        let oidc = OidcConfig::from_env()?;

        let sentry_sample_rate = parse_sample_rate("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            oidc,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OidcConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let issuer = get_required_env("OIDC_ISSUER_URL")?;
        let issuer_url = parse_http_url("OIDC_ISSUER_URL", &issuer)?;
        let ttl_secs = parse_env_or_default::<u64>("CLAIMS_CACHE_TTL_SECS", "60")?;

        Ok(Self {
            issuer_url,
            claims_cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Database URL from `FORKFUL_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present. Used by tools that need only the database.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("FORKFUL_DATABASE_URL")
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_sample_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_env_or_default(key, default)?;
    validate_sample_rate(key, rate)
}

fn validate_sample_rate(key: &str, rate: f32) -> Result<f32, ConfigError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

fn parse_http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = parse_value::<Url>(key, raw)?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/forkful"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            oidc: OidcConfig {
                issuer_url: Url::parse("https://sso.example.com/realms/forkful/").unwrap(),
                claims_cache_ttl: Duration::from_secs(60),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_userinfo_url_handles_trailing_slash() {
        let url = config().oidc.userinfo_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://sso.example.com/realms/forkful/protocol/openid-connect/userinfo"
        );
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let debug_output = format!("{:?}", config());
        assert!(!debug_output.contains("postgres://localhost/forkful"));
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("FORKFUL_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "FORKFUL_PORT"));
    }

    #[test]
    fn test_sample_rate_bounds() {
        assert!(validate_sample_rate("SENTRY_SAMPLE_RATE", 0.25).is_ok());
        assert!(validate_sample_rate("SENTRY_SAMPLE_RATE", 1.5).is_err());
        assert!(validate_sample_rate("SENTRY_SAMPLE_RATE", -0.1).is_err());
    }

    #[test]
    fn test_issuer_must_be_http() {
        assert!(parse_http_url("OIDC_ISSUER_URL", "https://sso.example.com/realms/x").is_ok());
        assert!(parse_http_url("OIDC_ISSUER_URL", "file:///etc/passwd").is_err());
        assert!(parse_http_url("OIDC_ISSUER_URL", "not a url").is_err());
    }
}
