//! Domain models for storefront.

pub mod session;

pub use session::{StoredUser, keys as session_keys};
