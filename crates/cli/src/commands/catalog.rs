//! Catalog browsing commands.
//!
//! The CMS client degrades failures to empty results, so listings never
//! fail; lookups by slug report [`AppError::NotFound`] instead.

use tienda_storefront::error::{AppError, Result};
use tienda_storefront::AppState;

use crate::render;

/// List products, optionally narrowed to featured ones or one category.
pub async fn products(state: &AppState, featured: bool, category: Option<&str>) -> Result<()> {
    let cms = state.cms();
    let products = match (featured, category) {
        (true, _) => cms.get_featured_products().await,
        (false, Some(slug)) => cms.get_products_by_category(slug).await,
        (false, None) => cms.get_products().await,
    };

    tracing::debug!(count = products.len(), "Listed products");
    render::product_list(&products);
    Ok(())
}

/// Show one product.
pub async fn product(state: &AppState, slug: &str) -> Result<()> {
    let product = state
        .cms()
        .get_product_by_slug(slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;

    render::product_detail(&product, state.cms().base_url());
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<()> {
    render::category_list(&state.cms().get_categories().await);
    Ok(())
}

/// Show a category with its products.
pub async fn category(state: &AppState, slug: &str) -> Result<()> {
    let cms = state.cms();
    let (category, products) = tokio::join!(
        cms.get_category_by_slug(slug),
        cms.get_products_by_category(slug)
    );
    let category = category.ok_or_else(|| AppError::NotFound(format!("category '{slug}'")))?;

    render::category_header(&category);
    render::product_list(&products);
    Ok(())
}

pub async fn store(state: &AppState) -> Result<()> {
    let config = state
        .cms()
        .get_store_config()
        .await
        .ok_or_else(|| AppError::NotFound("store config".to_string()))?;

    render::store_config(&config, state.cms().base_url());
    Ok(())
}

pub async fn hero(state: &AppState) -> Result<()> {
    let hero = state
        .cms()
        .get_hero_section()
        .await
        .ok_or_else(|| AppError::NotFound("hero section".to_string()))?;

    render::hero(&hero, state.cms().base_url());
    Ok(())
}
