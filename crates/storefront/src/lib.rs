//! Tienda storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! - [`cms`] reads the catalog from the headless CMS
//! - [`cart`] holds the shopping cart and persists it locally
//! - [`checkout`] turns the cart into a messaging deep link

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod cms;
pub mod config;
pub mod error;
pub mod state;

pub use error::{AppError, Result};
pub use state::AppState;
