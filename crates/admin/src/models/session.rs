//! Session-related types for admin authentication.
//!
//! The admin's client storage is its session: the bearer token issued by the
//! merchant backend sits under `token` and the account under `user`, the
//! same keys the storefront uses.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::merchant::AccountUser;

/// The signed-in operator, assembled from the `user` and `token` keys.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub user: AccountUser,
    pub token: SecretString,
}

impl CurrentAdmin {
    /// Name to greet the operator with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.user.name.is_empty() {
            &self.user.email
        } else {
            &self.user.name
        }
    }
}

/// A login that is waiting for its one-time code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub name: String,
    pub email: String,
}

/// Whether a flash reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A one-shot message shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// Session keys for admin data.
pub mod keys {
    /// Signed-in account (JSON object).
    pub const USER: &str = "user";

    /// Bearer token issued by the merchant backend (string).
    pub const TOKEN: &str = "token";

    /// Login awaiting its one-time code.
    pub const PENDING_LOGIN: &str = "pending_login";

    /// One-shot message for the next page.
    pub const FLASH: &str = "flash";

    /// Profile and preferences edited on the settings page.
    pub const SETTINGS: &str = "settings";

    /// Orders edited on the orders panel.
    pub const ORDERS: &str = "orders";

    /// Product categories.
    pub const CATEGORIES: &str = "categories";
}
