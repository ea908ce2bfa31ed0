//! Domain models for admin.

pub mod session;

pub use session::{CurrentAdmin, Flash, FlashKind, PendingLogin, keys as session_keys};
