//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLOVER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CLOVER_REDIS_URL` - Redis connection string (falls back to `REDIS_URL`)
//! - `CLOVER_CLIENT_URL` - Public URL of the web frontend (checkout redirects)
//! - `CLOVER_ACCESS_TOKEN_SECRET` - Access token signing secret (high entropy)
//! - `CLOVER_REFRESH_TOKEN_SECRET` - Refresh token signing secret (high entropy)
//! - `PAYMENT_SECRET_KEY` - Payment gateway API secret key
//!
//! ## Optional
//! - `CLOVER_HOST` - Bind address (default: 127.0.0.1)
//! - `CLOVER_PORT` - Listen port (default: 5000)
//! - `CLOVER_ENV` - `development` or `production` (default: development);
//!   production marks auth cookies `Secure`
//! - `PAYMENT_API_URL` - Payment gateway base URL (default: <https://api.stripe.com>)
//! - `IMAGE_API_URL` - Image host base URL; image upload is skipped when unset
//! - `IMAGE_API_KEY` - Image host API key (required when `IMAGE_API_URL` is set)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Redis connection URL (refresh token store)
    pub redis_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the web frontend, used for checkout redirect URLs
    pub client_url: String,
    /// Whether the server runs in production mode (Secure cookies)
    pub production: bool,
    /// Token signing configuration
    pub tokens: TokenConfig,
    /// Payment gateway configuration
    pub payments: PaymentConfig,
    /// Image host configuration (optional)
    pub images: Option<ImageHostConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// JWT signing secrets for the auth layer.
#[derive(Clone)]
pub struct TokenConfig {
    /// Access token signing secret (15-minute tokens)
    pub access_secret: SecretString,
    /// Refresh token signing secret (7-day tokens)
    pub refresh_secret: SecretString,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .finish()
    }
}

/// Payment gateway configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway base URL (overridable for tests)
    pub api_url: String,
    /// Gateway API secret key
    pub secret_key: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Image host configuration.
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Image host base URL
    pub api_url: String,
    /// Image host API key
    pub api_key: String,
    /// Folder uploaded product images are placed under
    pub folder: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_url_with_fallback("CLOVER_DATABASE_URL", "DATABASE_URL")?;
        let redis_url = get_url_with_fallback("CLOVER_REDIS_URL", "REDIS_URL")?;
        let host = get_env_or_default("CLOVER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CLOVER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CLOVER_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CLOVER_PORT".to_string(), e.to_string()))?;
        let client_url = get_required_env("CLOVER_CLIENT_URL")?;
        url::Url::parse(&client_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CLOVER_CLIENT_URL".to_string(), e.to_string())
        })?;
        let production = get_env_or_default("CLOVER_ENV", "development") == "production";

        let tokens = TokenConfig::from_env()?;
        let payments = PaymentConfig::from_env()?;
        let images = ImageHostConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            redis_url,
            host,
            port,
            client_url,
            production,
            tokens,
            payments,
            images,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TokenConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let access_secret = get_validated_secret("CLOVER_ACCESS_TOKEN_SECRET")?;
        validate_token_secret(&access_secret, "CLOVER_ACCESS_TOKEN_SECRET")?;
        let refresh_secret = get_validated_secret("CLOVER_REFRESH_TOKEN_SECRET")?;
        validate_token_secret(&refresh_secret, "CLOVER_REFRESH_TOKEN_SECRET")?;

        Ok(Self {
            access_secret,
            refresh_secret,
        })
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("PAYMENT_API_URL", "https://api.stripe.com"),
            secret_key: get_required_env("PAYMENT_SECRET_KEY").map(SecretString::from)?,
        })
    }
}

impl ImageHostConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_url) = get_optional_env("IMAGE_API_URL") else {
            return Ok(None);
        };

        Ok(Some(Self {
            api_url,
            api_key: get_required_env("IMAGE_API_KEY")?,
            folder: get_env_or_default("IMAGE_UPLOAD_FOLDER", "products"),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a connection URL, trying the Clover-specific key first and falling
/// back to the generic one (set by managed hosting attach commands).
fn get_url_with_fallback(primary_key: &str, fallback_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var(fallback_key) {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-signing-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_token_secret(&secret, "TEST_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/clover"),
            redis_url: SecretString::from("redis://localhost:6379"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            client_url: "http://localhost:5173".to_string(),
            production: false,
            tokens: TokenConfig {
                access_secret: SecretString::from("x".repeat(32)),
                refresh_secret: SecretString::from("y".repeat(32)),
            },
            payments: PaymentConfig {
                api_url: "https://api.stripe.com".to_string(),
                secret_key: SecretString::from("sk_test_123"),
            },
            images: None,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_token_config_debug_redacts_secrets() {
        let config = TokenConfig {
            access_secret: SecretString::from("super_private_access_key"),
            refresh_secret: SecretString::from("super_private_refresh_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_access_key"));
        assert!(!debug_output.contains("super_private_refresh_key"));
    }
}
