//! Session-related types.
//!
//! Per-visitor state lives in the session. The `cart`, `user` and `token`
//! keys are durable for the life of the cookie; `checkout` is transient and
//! dropped when a checkout is cancelled or completes.

use serde::{Deserialize, Serialize};

use navdana_core::UserId;

/// Buyer identity returned by OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Session keys.
pub mod keys {
    /// Snapshot of the cart lines (JSON array).
    pub const CART: &str = "cart";

    /// Verified buyer (JSON object).
    pub const USER: &str = "user";

    /// Bearer token issued by the merchant backend (string).
    pub const TOKEN: &str = "token";

    /// In-progress checkout.
    pub const CHECKOUT: &str = "checkout";
}
