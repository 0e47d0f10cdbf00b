//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WARDROBE_API_BASE_URL` - Base URL of the Virtual Wardrobe REST API
//!
//! ## Optional
//! - `WARDROBE_CREDENTIALS_PATH` - Credential file (default: `.wardrobe/credentials.json`)
//! - `WARDROBE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `WARDROBE_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `WARDROBE_CATALOG_CACHE_CAPACITY` - Catalog cache capacity (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CREDENTIALS_PATH: &str = ".wardrobe/credentials.json";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CATALOG_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Where the session credential is persisted
    pub credentials_path: PathBuf,
    /// Catalog cache configuration
    pub catalog_cache: CatalogCacheConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Remote API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every request path is appended to (e.g. `https://shop.example/api`)
    pub base_url: Url,
    /// Optional per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

/// Catalog cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CatalogCacheConfig {
    /// Time a cached catalog response stays valid
    pub time_to_live: Duration,
    /// Maximum number of cached responses
    pub max_capacity: u64,
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self {
            time_to_live: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            max_capacity: DEFAULT_CATALOG_CACHE_CAPACITY,
        }
    }
}

impl StorefrontConfig {
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

        let api = ApiConfig::from_env()?;
        let credentials_path =
            PathBuf::from(get_env_or_default("WARDROBE_CREDENTIALS_PATH", DEFAULT_CREDENTIALS_PATH));
        let catalog_cache = CatalogCacheConfig::from_env()?;

        Ok(Self {
            api,
            credentials_path,
            catalog_cache,
            sentry_dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Build a configuration for a base URL with every optional setting at its default.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            api: ApiConfig {
                base_url,
                request_timeout: None,
            },
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            catalog_cache: CatalogCacheConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("WARDROBE_API_BASE_URL")?;
        let base_url = parse_base_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("WARDROBE_API_BASE_URL".to_string(), e))?;

        let request_timeout = get_optional_parsed::<u64>("WARDROBE_REQUEST_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            request_timeout,
        })
    }
}

impl CatalogCacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            time_to_live: Duration::from_secs(get_parsed_or_default(
                "WARDROBE_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CATALOG_CACHE_TTL_SECS,
            )?),
            max_capacity: get_parsed_or_default(
                "WARDROBE_CATALOG_CACHE_CAPACITY",
                DEFAULT_CATALOG_CACHE_CAPACITY,
            )?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check an API base URL.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional environment variable.
fn get_optional_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse an environment variable, falling back to a default when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_optional_parsed(key)?.unwrap_or(default))
}
