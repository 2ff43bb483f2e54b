//! Application state shared across commands.

use std::sync::Arc;

use tienda_core::PhoneNumber;
use tracing::debug;

use crate::cart::{CartStore, FileStorage};
use crate::checkout::resolve_phone;
use crate::cms::CmsClient;
use crate::config::StorefrontConfig;
use crate::error::Result;

/// Application state shared across all commands.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the CMS client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cms: CmsClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let cms = CmsClient::new(&config.cms)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, cms }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }

    /// Open the persisted cart under the configured cart directory.
    #[must_use]
    pub fn open_cart(&self) -> CartStore<FileStorage> {
        CartStore::open(FileStorage::new(&self.inner.config.cart_dir))
    }

    /// Resolve the order phone number, asking the CMS first.
    pub async fn order_phone(&self) -> Option<PhoneNumber> {
        let store_config = self.inner.cms.get_store_config().await;
        let phone = resolve_phone(store_config.as_ref(), &self.inner.config.messaging);
        debug!(found = phone.is_some(), "Resolved order phone");
        phone
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("cms", &self.inner.cms.base_url().as_str())
            .finish()
    }
}
