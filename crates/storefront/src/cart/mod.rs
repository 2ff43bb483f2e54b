//! Cart state container.
//!
//! [`CartStore`] exclusively owns the cart's [`CartSnapshot`]. It is built
//! explicitly over a [`CartStorage`] backend, rehydrates once when opened,
//! and after every mutation writes the snapshot back and notifies
//! subscribers, in that order.
//!
//! All mutation happens through `&mut self` on one thread; subscribers only
//! ever see `&CartSnapshot`.
//!
//! # Example
//!
//! ```rust,ignore
//! use tienda_storefront::cart::{CartStore, FileStorage};
//!
//! let mut cart = CartStore::open(FileStorage::new(&config.cart_dir));
//! let badge = cart.subscribe(|snapshot| render_badge(&snapshot.badge_label()));
//!
//! cart.add_item(product.to_cart_product(cms.base_url()), 2);
//! cart.set_quantity(product.id, 0); // removes the line
//!
//! cart.unsubscribe(badge);
//! ```

mod storage;

use tienda_core::{CartLine, CartProduct, CartSnapshot, ProductId};
use tracing::{debug, warn};

pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

/// Storage slot holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart-data";

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CartSnapshot)>;

/// The cart state container.
pub struct CartStore<S: CartStorage> {
    snapshot: CartSnapshot,
    storage: S,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: CartStorage> CartStore<S> {
    /// Open a cart over `storage`, rehydrating any persisted snapshot.
    ///
    /// Unreadable or malformed persisted data is discarded and the cart
    /// starts empty; nothing is reported to the caller.
    pub fn open(storage: S) -> Self {
        let snapshot = load_snapshot(&storage);
        debug!(lines = snapshot.len(), "Cart opened");
        Self {
            snapshot,
            storage,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.snapshot.get(id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Tear down the store, handing back its storage backend.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Add `quantity` units of a product. Existing lines are incremented.
    ///
    /// A quantity of zero changes nothing. Returns whether the cart changed.
    pub fn add_item(&mut self, product: CartProduct, quantity: u32) -> bool {
        let id = product.id;
        if !self.snapshot.add(product, quantity) {
            return false;
        }
        debug!(product_id = %id, quantity, "Added to cart");
        self.commit();
        true
    }

    /// Add a single unit of a product.
    pub fn add_one(&mut self, product: CartProduct) -> bool {
        self.add_item(product, 1)
    }

    /// Remove a product's line. Unknown products are a no-op.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        if self.snapshot.remove(id).is_none() {
            return false;
        }
        debug!(product_id = %id, "Removed from cart");
        self.commit();
        true
    }

    /// Overwrite a line's quantity; zero removes the line.
    ///
    /// Unknown products are a no-op. Returns whether the cart changed.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        if !self.snapshot.set_quantity(id, quantity) {
            return false;
        }
        debug!(product_id = %id, quantity, "Updated cart quantity");
        self.commit();
        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.snapshot.clear();
        debug!("Cleared cart");
        self.commit();
    }

    /// Register a callback for every future mutation.
    ///
    /// The callback runs once immediately with the current snapshot.
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&CartSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        callback(&self.snapshot);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Persist, then notify.
    fn commit(&mut self) {
        self.persist();
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.snapshot);
        }
    }

    /// Write the snapshot to storage. Failures are logged, never raised;
    /// the in-memory snapshot stays authoritative.
    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.save(CART_STORAGE_KEY, &json) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

impl<S: CartStorage + std::fmt::Debug> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("snapshot", &self.snapshot)
            .field("storage", &self.storage)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Read the persisted snapshot, treating any failure as an empty cart.
fn load_snapshot<S: CartStorage>(storage: &S) -> CartSnapshot {
    let raw = match storage.load(CART_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return CartSnapshot::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read persisted cart, starting empty");
            return CartSnapshot::new();
        }
    };

    match serde_json::from_str::<CartSnapshot>(&raw) {
        Ok(mut snapshot) => {
            let dropped = snapshot.normalize();
            if dropped > 0 {
                debug!(dropped, "Dropped invalid persisted cart lines");
            }
            snapshot
        }
        Err(e) => {
            warn!(error = %e, "Discarding malformed persisted cart");
            CartSnapshot::new()
        }
    }
}
