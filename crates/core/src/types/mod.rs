//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod phone;
pub mod price;

pub use cart::{CartLine, CartProduct, CartSnapshot};
pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{Price, PriceError, format_amount};
