//! Navdana Core - Shared domain types.
//!
//! This crate provides the types used across all Navdana components:
//! - `storefront` - Public shop (browsing, cart, guest checkout)
//! - `admin` - Dashboard (banners, reports, settings)
//! - `cli` - Operator tooling
//!
//! # Architecture
//!
//! The core crate holds pure data and pure state transitions only: no I/O,
//! no HTTP clients, no session access. Persistence and network calls live in
//! the binaries, which drive these types.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`banner`] - Home page banners
//! - [`cart`] - Cart lines, identity keys and the cart reducer
//! - [`checkout`] - Checkout stages and shipping details
//! - [`color`] - Human-readable names for hex colors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod banner;
pub mod cart;
pub mod checkout;
pub mod color;
pub mod types;

pub use banner::Banner;
pub use cart::{Cart, CartAction, CartLine, LineKey, NewLine};
pub use checkout::{CheckoutStage, PaymentMethod, ShippingField, ShippingInfo};
pub use types::*;
