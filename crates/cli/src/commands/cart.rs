//! Cart commands.
//!
//! Each command opens the persisted cart, applies one mutation and renders
//! the cart panel from the snapshot its subscriber last received.

use std::cell::RefCell;
use std::rc::Rc;

use tienda_core::{CartSnapshot, ProductId};
use tienda_storefront::AppState;
use tienda_storefront::cart::{CartStorage, CartStore};
use tienda_storefront::error::{AppError, Result, add_breadcrumb};

use crate::render;

/// Run `mutate` against the cart and render the resulting panel.
///
/// Returns whether the cart changed.
fn with_panel<S, F>(cart: &mut CartStore<S>, mutate: F) -> bool
where
    S: CartStorage,
    F: FnOnce(&mut CartStore<S>) -> bool,
{
    let latest = Rc::new(RefCell::new(CartSnapshot::new()));
    let sink = Rc::clone(&latest);
    let subscription = cart.subscribe(move |snapshot| *sink.borrow_mut() = snapshot.clone());

    let changed = mutate(cart);

    cart.unsubscribe(subscription);
    render::cart_panel(&latest.borrow());
    changed
}

pub fn show(state: &AppState) {
    render::cart_panel(state.open_cart().snapshot());
}

/// Add a product, looked up by slug, to the cart.
pub async fn add(state: &AppState, slug: &str, quantity: u32) -> Result<()> {
    let product = state
        .cms()
        .get_product_by_slug(slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;

    if product.is_sold_out() {
        return Err(AppError::BadRequest(format!("'{}' is sold out", product.name)));
    }

    let item = product.to_cart_product(state.cms().base_url());
    let mut cart = state.open_cart();
    with_panel(&mut cart, |cart| cart.add_item(item, quantity));

    let (product_id, quantity) = (product.id.to_string(), quantity.to_string());
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str()), ("quantity", quantity.as_str())]),
    );
    Ok(())
}

pub fn remove(state: &AppState, id: ProductId) {
    let mut cart = state.open_cart();
    if !with_panel(&mut cart, |cart| cart.remove_item(id)) {
        render::notice(&format!("Product {id} is not in the cart"));
    }
}

/// Overwrite a line's quantity; zero removes it.
pub fn set(state: &AppState, id: ProductId, quantity: u32) {
    let mut cart = state.open_cart();
    if !with_panel(&mut cart, |cart| cart.set_quantity(id, quantity)) {
        render::notice(&format!("Product {id} is not in the cart"));
    }
}

pub fn clear(state: &AppState) {
    let mut cart = state.open_cart();
    with_panel(&mut cart, |cart| {
        cart.clear();
        true
    });
    add_breadcrumb("cart", "Cleared cart", None);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::{CartProduct, Price};
    use tienda_storefront::cart::MemoryStorage;

    use super::*;

    fn product(id: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::ZERO,
            image: "/placeholder.jpg".to_string(),
            slug: format!("product-{id}"),
        }
    }

    #[test]
    fn test_with_panel_reports_change() {
        let mut cart = CartStore::open(MemoryStorage::new());
        assert!(with_panel(&mut cart, |cart| cart.add_item(product(1), 2)));
        assert!(!with_panel(&mut cart, |cart| cart.remove_item(ProductId::new(9))));
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    }
}
