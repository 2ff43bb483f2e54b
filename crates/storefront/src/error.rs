//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors to
//! Sentry before they are reported to the user. All commands should return
//! `Result<T, AppError>`.

use std::process::ExitCode;

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::cms::CmsError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CMS operation failed.
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    /// Checkout could not be completed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error points at a fault in the system rather than at the
    /// user's input.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Cms(_) | Self::Checkout(CheckoutError::Url(_)))
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        // Don't expose internal error details
        match self {
            Self::Cms(_) => "The catalog is unavailable, please try again later".to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::MissingField(field) => format!("Please fill in the {field} field"),
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::MissingPhone => {
                    "Ordering is not available: no phone number is configured".to_string()
                }
                CheckoutError::Url(_) => "Internal error".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Log the error, capturing unexpected ones to Sentry, and pick the
    /// process exit code.
    #[must_use]
    pub fn report(&self) -> ExitCode {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::debug!(error = %self, "Command rejected");
        }
        ExitCode::FAILURE
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
