//! Ordering commands.
//!
//! Nothing is sent from here: each command prints a messaging deep link for
//! the user to open.

use tienda_storefront::AppState;
use tienda_storefront::checkout::{
    self, CheckoutError, CheckoutForm, cart_message, deep_link, inquiry_message,
};
use tienda_storefront::error::{AppError, Result, add_breadcrumb};

use crate::render;

/// Validate the form, compose the order and empty the cart.
pub async fn order(state: &AppState, form: &CheckoutForm) -> Result<()> {
    // `checkout` validates again; this early call keeps a bad form off the
    // CMS round-trip in `order_phone`
    form.validate()?;

    let phone = state.order_phone().await;
    let mut cart = state.open_cart();
    let link = checkout::checkout(&mut cart, form, phone.as_ref(), &state.config().messaging)?;

    add_breadcrumb("checkout", "Order composed", Some(&[("payment", form.payment.as_str())]));
    render::link("Open this link to send your order:", &link);
    Ok(())
}

/// Print a quick order link for the cart. The cart is left as is.
pub async fn cart_link(state: &AppState) -> Result<()> {
    let cart = state.open_cart();
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let phone = state.order_phone().await.ok_or(CheckoutError::MissingPhone)?;
    let messaging = &state.config().messaging;
    let message = cart_message(cart.snapshot(), &messaging.message_prefix);
    let link = deep_link(&messaging.base_url, &phone, &message)?;

    render::link("Open this link to send your cart:", &link);
    Ok(())
}

/// Print a link asking about one product.
pub async fn ask(state: &AppState, slug: &str, quantity: u32) -> Result<()> {
    let (product, phone) = tokio::join!(
        state.cms().get_product_by_slug(slug),
        state.order_phone()
    );
    let product = product.ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;
    let phone = phone.ok_or(CheckoutError::MissingPhone)?;

    let message = inquiry_message(&product.name, quantity);
    let link = deep_link(&state.config().messaging.base_url, &phone, &message)?;

    render::link("Open this link to ask about it:", &link);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::{CartProduct, Price, ProductId};
    use tienda_storefront::config::StorefrontConfig;

    use super::*;

    fn state(cart_dir: &std::path::Path) -> AppState {
        let cart_dir = cart_dir.to_string_lossy().into_owned();
        let config = StorefrontConfig::from_lookup(|key| match key {
            // Nothing listens on the discard port
            "STRAPI_URL" => Some("http://127.0.0.1:9".to_string()),
            "WHATSAPP_NUMBER" => Some("5355551234".to_string()),
            "TIENDA_CART_DIR" => Some(cart_dir.clone()),
            _ => None,
        })
        .unwrap();
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_order_rejects_blank_form_and_keeps_cart() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let mut cart = state.open_cart();
        cart.add_item(
            CartProduct {
                id: ProductId::new(1),
                name: "Café".to_string(),
                price: Price::ZERO,
                image: "/placeholder.jpg".to_string(),
                slug: "cafe".to_string(),
            },
            1,
        );

        let form = CheckoutForm::default();
        let err = order(&state, &form).await.unwrap_err();
        assert!(matches!(err, AppError::Checkout(CheckoutError::MissingField("date"))));
        assert_eq!(state.open_cart().len(), 1);
    }
}
