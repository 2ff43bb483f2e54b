//! Terminal output.
//!
//! Everything the user is meant to read goes to stdout from here; logs go to
//! stderr through `tracing`.
#![allow(clippy::print_stdout)]

use std::process::ExitCode;

use tienda_core::CartSnapshot;
use tienda_storefront::AppError;
use tienda_storefront::cms::{Category, HeroSection, Product, StoreConfig, media_url};
use url::Url;

pub fn product_list(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        let sold_out = if product.is_sold_out() { "  (sold out)" } else { "" };
        println!(
            "{:>5}  {:<40} ${:>10}  {}{sold_out}",
            product.id.to_string(),
            product.name,
            product.price.to_string(),
            product.slug
        );
    }
}

pub fn product_detail(product: &Product, base_url: &Url) {
    println!("{}", product.name);
    println!("  ID:       {}", product.id);
    println!("  Price:    ${}", product.price);
    if let Some(category) = &product.category {
        println!("  Category: {} ({})", category.name, category.slug);
    }
    if let Some(stock) = product.stock {
        println!("  Stock:    {stock}");
    }
    println!(
        "  Image:    {}",
        media_url(base_url, product.primary_image().map(|m| m.url.as_str()))
    );
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn category_list(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    for category in categories {
        println!("{:<30} {}", category.name, category.slug);
    }
}

pub fn category_header(category: &Category) {
    println!("{}", category.name);
    if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!();
}

pub fn store_config(config: &StoreConfig, base_url: &Url) {
    println!("{}", config.store_name);
    if !config.description.is_empty() {
        println!("{}", config.description);
    }
    println!();
    let rows = [
        ("Email", Some(config.email.as_str())),
        ("Phone", Some(config.phone.as_str())),
        ("WhatsApp", config.whatsapp_number.as_deref()),
        ("Address", config.address.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {label:<9} {value}");
        }
    }
    if let Some(logo) = &config.logo {
        println!("  {:<9} {}", "Logo", media_url(base_url, Some(&logo.url)));
    }
    if let Some(social) = &config.social_media {
        let links = [
            ("Facebook", &social.facebook),
            ("Instagram", &social.instagram),
            ("Twitter", &social.twitter),
        ];
        for (label, link) in links {
            if let Some(link) = link {
                println!("  {label:<9} {link}");
            }
        }
    }
}

pub fn hero(hero: &HeroSection, base_url: &Url) {
    if hero.images.is_empty() {
        println!("No hero images.");
    }
    for image in &hero.images {
        println!("{}", media_url(base_url, Some(&image.url)));
    }
}

/// The cart panel: one row per line, then the total and the badge count.
pub fn cart_panel(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in snapshot.lines() {
        println!(
            "{:>5}  {:<40} {:>4} x ${:<10} ${}",
            line.id.to_string(),
            line.name,
            line.quantity,
            line.price.to_string(),
            line.line_total()
        );
    }
    println!();
    println!(
        "Total: ${}  ({} items, badge {})",
        snapshot.total_price(),
        snapshot.total_quantity(),
        snapshot.badge_label()
    );
}

pub fn link(caption: &str, link: &Url) {
    println!("{caption}");
    println!("{link}");
}

pub fn notice(message: &str) {
    println!("{message}");
}

/// Report a failed command and return the exit code.
#[allow(clippy::print_stderr)]
pub fn failure(error: &AppError) -> ExitCode {
    let code = error.report();
    eprintln!("Error: {}", error.user_message());
    code
}
