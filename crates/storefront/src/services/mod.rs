//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `storage` - Per-visitor key/value storage (the session)
//! - `cart` - Cart persistence around the pure cart model
//! - `identity` - The buyer's verified user and token
//! - `checkout` - Guest checkout state machine

pub mod cart;
pub mod checkout;
pub mod identity;
pub mod storage;

pub use cart::CartStore;
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutSession, Notice, NoticeKind, WidgetOutcome};
pub use identity::SessionIdentity;
pub use storage::{ClientStorage, StorageError};
