//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! ## CMS
//! - `STRAPI_URL` - Base URL of the CMS (default: `http://localhost:1337`)
//! - `STRAPI_API_TOKEN` - Read-only API token sent as a bearer token
//!
//! ## Messaging
//! - `WHATSAPP_BASE_URL` - Deep link base (default: `https://wa.me`)
//! - `WHATSAPP_NUMBER` - Order phone number, used when the CMS store config has none
//! - `WHATSAPP_MESSAGE_PREFIX` - First line of the quick cart message
//! - `DELIVERY_NOTE` - Note appended to order messages (default: free delivery in Bayamo only)
//!
//! ## Local
//! - `TIENDA_CART_DIR` - Directory holding the persisted cart (default: platform data dir)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tienda_core::PhoneNumber;
use url::Url;

const DEFAULT_STRAPI_URL: &str = "http://localhost:1337";
const DEFAULT_WHATSAPP_BASE_URL: &str = "https://wa.me";
const DEFAULT_MESSAGE_PREFIX: &str = "Hola! Me gustaría hacer un pedido:";
const DEFAULT_DELIVERY_NOTE: &str = "Nota: Domicilio gratis solo en la ciudad de Bayamo.";
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
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// CMS connection settings
    pub cms: CmsConfig,
    /// Checkout hand-off settings
    pub messaging: MessagingConfig,
    /// Directory holding the persisted cart
    pub cart_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// CMS connection settings.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CmsConfig {
    /// Base URL that API endpoints and relative media paths resolve against
    pub base_url: Url,
    /// Optional read-only API token
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Messaging deep link settings.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Deep link base, e.g. `https://wa.me`
    pub base_url: Url,
    /// Fallback phone number when the CMS store config has none
    pub phone: Option<PhoneNumber>,
    /// First line of the quick cart message
    pub message_prefix: String,
    /// Note appended to order messages
    pub delivery_note: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or the
    /// API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let cms = CmsConfig {
            base_url: env.url_or_default("STRAPI_URL", DEFAULT_STRAPI_URL)?,
            api_token: env.validated_secret("STRAPI_API_TOKEN")?,
        };

        let phone = env
            .optional("WHATSAPP_NUMBER")
            .map(|value| {
                PhoneNumber::parse(&value).map_err(|e| {
                    ConfigError::InvalidEnvVar("WHATSAPP_NUMBER".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let messaging = MessagingConfig {
            base_url: env.url_or_default("WHATSAPP_BASE_URL", DEFAULT_WHATSAPP_BASE_URL)?,
            phone,
            message_prefix: env.or_default("WHATSAPP_MESSAGE_PREFIX", DEFAULT_MESSAGE_PREFIX),
            delivery_note: env.or_default("DELIVERY_NOTE", DEFAULT_DELIVERY_NOTE),
        };

        let cart_dir = env
            .optional("TIENDA_CART_DIR")
            .map_or_else(default_cart_dir, PathBuf::from);

        Ok(Self {
            cms,
            messaging,
            cart_dir,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Platform data directory, falling back to `.tienda` in the working directory.
fn default_cart_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".tienda"), |dir| dir.join("tienda"))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the parsing helpers used above.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a URL variable with a default value.
    fn url_or_default(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let value = self.or_default(key, default);
        let url = Url::parse(&value)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }
        Ok(url)
    }

    /// Load and validate an optional secret.
    fn validated_secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        self.optional(key)
            .map(|value| {
                validate_secret_strength(&value, key)?;
                Ok(SecretString::from(value))
            })
            .transpose()
    }
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
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the full token from the CMS admin."
            ),
        ));
    }

    Ok(())
}

/// Expose the API token for building the authorization header.
pub(crate) fn bearer_value(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
