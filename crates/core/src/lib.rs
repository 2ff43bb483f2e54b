//! Tienda Core - Shared types library.
//!
//! This crate provides common types used across all Tienda components:
//! - `storefront` - CMS client, cart container and checkout composer
//! - `cli` - Command-line front-end for browsing, cart and checkout
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, phone numbers, and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
