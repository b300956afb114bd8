//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Remote mode
//! - `CART_API_BASE_URL` - Base URL of the remote cart API (unset disables remote mode)
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token for the remote cart API
//! - `CART_API_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `CART_STORAGE_KEY` - Key holding the anonymous cart (default: `cardfactory_cart`)
//! - `CART_STORAGE_DIR` - Directory for the file-backed store (default: `.cardfactory`)
//! - `CART_EVENT_CAPACITY` - Buffered notifications per subscriber (default: 16)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default key for the anonymous cart slot.
pub const DEFAULT_STORAGE_KEY: &str = "cardfactory_cart";

const DEFAULT_STORAGE_DIR: &str = ".cardfactory";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote cart API configuration, present when `CART_API_BASE_URL` is set
    pub remote: Option<RemoteCartConfig>,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Remote cart API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct RemoteCartConfig {
    /// Base URL; cart endpoints are resolved relative to it
    pub base_url: Url,
    /// Bearer token sent with every request
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteCartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Local storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Key holding the serialized anonymous cart
    pub key: String,
    /// Directory used by the file-backed store
    pub dir: PathBuf,
    /// Buffered change notifications per subscriber
    pub event_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable that is set fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = get_optional_env("CART_API_BASE_URL")
            .map(|_| RemoteCartConfig::from_env())
            .transpose()?;

        Ok(Self {
            remote,
            storage: StorageConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }

    /// The remote API section, for callers that cannot run without it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `CART_API_BASE_URL` was unset.
    pub fn require_remote(&self) -> Result<&RemoteCartConfig, ConfigError> {
        self.remote
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("CART_API_BASE_URL".to_string()))
    }
}

impl RemoteCartConfig {
    /// Load the remote API section from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CART_API_BASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_required_env("CART_API_BASE_URL")?)?;
        let timeout_secs = get_env_or_default(
            "CART_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("CART_API_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            api_token: get_optional_env("CART_API_TOKEN")
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let key = get_env_or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        validate_storage_key(&key)?;

        let event_capacity = get_env_or_default(
            "CART_EVENT_CAPACITY",
            &DEFAULT_EVENT_CAPACITY.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnvVar("CART_EVENT_CAPACITY".to_string(), e.to_string()))?;
        if event_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_EVENT_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            key,
            dir: PathBuf::from(get_env_or_default("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            event_capacity,
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// the full path (`https://api/v1` + `cart` would otherwise drop `v1`).
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CART_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Storage keys double as file names in the file-backed store.
fn validate_storage_key(key: &str) -> Result<(), ConfigError> {
    if crate::store::is_valid_key(key) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "CART_STORAGE_KEY".to_string(),
            format!("'{key}' may only contain letters, digits, '_', '-' and '.'"),
        ))
    }
}
