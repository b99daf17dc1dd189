//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLUEJAY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BLUEJAY_JWT_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BLUEJAY_HOST` - Bind address (default: 127.0.0.1)
//! - `BLUEJAY_PORT` - Listen port (default: 5000)
//! - `BLUEJAY_ACCESS_TOKEN_MINUTES` - Access token lifetime, 1 to 1440 (default: 15)
//! - `BLUEJAY_REFRESH_TOKEN_DAYS` - Refresh token lifetime, 1 to 365 (default: 30)
//! - `BLUEJAY_COOKIE_SECURE` - Only send JWT cookies over HTTPS (default: false)
//! - `BLUEJAY_CSRF_PROTECT` - Require the CSRF double-submit header (default: true)
//! - `BLUEJAY_RATE_LIMIT` - Rate limit login and signup (default: true)
//! - `BLUEJAY_TRUST_PROXY_HEADERS` - Key the rate limiter on `X-Forwarded-For` /
//!   `X-Real-IP` instead of the peer address; only set behind a proxy that
//!   overwrites them (default: false)
//! - `BLUEJAY_LOG_JSON` - Emit JSON logs (default: false)
//! - `STRIPE_SECRET_KEY` - Stripe API key; payments run offline when unset
//! - `STRIPE_CURRENCY` - ISO currency for payment intents (default: usd)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Longest accepted access token lifetime (one day).
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 24 * 60;
/// Longest accepted refresh token lifetime (one year).
pub const MAX_REFRESH_TOKEN_DAYS: i64 = 365;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "team-bluejay",
];

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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing and lifetimes
    pub jwt: JwtSettings,
    /// JWT cookie transport
    pub cookies: CookieSettings,
    /// Payment provider settings
    pub payments: PaymentSettings,
    /// Login and signup rate limiting
    pub rate_limit: RateLimitSettings,
    /// Whether logs are emitted as JSON
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// JWT signing configuration.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// HS256 secret
    pub secret: SecretString,
    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_days: i64,
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
}

/// Cookie transport configuration.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// Set the `Secure` attribute on every auth cookie.
    pub secure: bool,
    /// Require `X-CSRF-TOKEN` on mutating requests.
    pub csrf_protect: bool,
}

/// Rate limiting for login and signup.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    /// Limit login and signup per client IP.
    pub enabled: bool,
    /// Take the client IP from proxy headers rather than the TCP peer.
    /// Clients can forge these headers, so only enable this behind a
    /// reverse proxy that sets them.
    pub trust_proxy_headers: bool,
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PaymentSettings {
    /// Stripe secret key; `None` runs payments offline.
    pub stripe_secret_key: Option<SecretString>,
    /// Currency for payment intents
    pub currency: String,
}

impl std::fmt::Debug for PaymentSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSettings")
            .field(
                "stripe_secret_key",
                &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("currency", &self.currency)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the JWT secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BLUEJAY_DATABASE_URL")?;
        let host = parse_env("BLUEJAY_HOST", "127.0.0.1")?;
        let port = parse_env("BLUEJAY_PORT", "5000")?;

        let jwt = JwtSettings::from_env()?;
        let cookies = CookieSettings {
            secure: parse_bool_env("BLUEJAY_COOKIE_SECURE", false)?,
            csrf_protect: parse_bool_env("BLUEJAY_CSRF_PROTECT", true)?,
        };

        let payments = PaymentSettings {
            stripe_secret_key: get_optional_env("STRIPE_SECRET_KEY").map(SecretString::from),
            currency: get_env_or_default("STRIPE_CURRENCY", "usd").to_lowercase(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            cookies,
            payments,
            rate_limit: RateLimitSettings {
                enabled: parse_bool_env("BLUEJAY_RATE_LIMIT", true)?,
                trust_proxy_headers: parse_bool_env("BLUEJAY_TRUST_PROXY_HEADERS", false)?,
            },
            log_json: parse_bool_env("BLUEJAY_LOG_JSON", false)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_validated_secret("BLUEJAY_JWT_SECRET")?;
        validate_secret_length(&secret, "BLUEJAY_JWT_SECRET")?;

        let access_token_minutes: i64 = parse_env("BLUEJAY_ACCESS_TOKEN_MINUTES", "15")?;
        let refresh_token_days: i64 = parse_env("BLUEJAY_REFRESH_TOKEN_DAYS", "30")?;
        check_range("BLUEJAY_ACCESS_TOKEN_MINUTES", access_token_minutes, MAX_ACCESS_TOKEN_MINUTES)?;
        check_range("BLUEJAY_REFRESH_TOKEN_DAYS", refresh_token_days, MAX_REFRESH_TOKEN_DAYS)?;

        Ok(Self {
            secret,
            access_token_minutes,
            refresh_token_days,
            issuer: get_env_or_default("BLUEJAY_JWT_ISSUER", "bluejay"),
            audience: get_env_or_default("BLUEJAY_JWT_AUDIENCE", "bluejay-web"),
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

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(value) => parse_bool(&value)
            .ok_or_else(|| ConfigError::InvalidEnvVar(key.to_string(), format!("not a boolean: {value}"))),
    }
}

/// Require `1 <= value <= max`.
fn check_range(key: &str, value: i64, max: i64) -> Result<(), ConfigError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {max}, got {value}"),
        ))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
