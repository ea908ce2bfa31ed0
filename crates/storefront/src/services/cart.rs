//! Cart store: the cart reducer mirrored to visitor storage.
//!
//! Each request hydrates a [`CartStore`] from the `cart` key, dispatches at
//! most a handful of actions, and every dispatch writes the full line
//! collection back. Clearing removes the key instead of writing `[]`.

use navdana_core::{Cart, CartAction, CartLine};
use tracing::instrument;

use crate::models::session_keys;
use crate::services::storage::ClientStorage;

/// A visitor's cart bound to their storage.
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: ClientStorage> CartStore<S> {
    /// Hydrate the cart from storage.
    ///
    /// A missing key yields an empty cart. An unreadable snapshot is logged
    /// and also yields an empty cart; it is overwritten on the next write.
    pub async fn load(storage: S) -> Self {
        let cart = match storage.get_item::<Vec<CartLine>>(session_keys::CART).await {
            Ok(Some(lines)) => Cart::from_lines(lines),
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cart snapshot");
                Cart::new()
            }
        };

        Self { storage, cart }
    }

    /// Current cart state.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Apply an action and persist the result.
    ///
    /// Persistence failures are logged and swallowed; the in-memory cart is
    /// already correct.
    #[instrument(skip(self), fields(lines = self.cart.lines().len()))]
    pub async fn dispatch(&mut self, action: CartAction) -> &Cart {
        let clearing = matches!(action, CartAction::Clear);
        self.cart.apply(action);

        if clearing {
            self.forget().await;
        } else {
            self.persist().await;
        }

        &self.cart
    }

    /// Empty the cart and remove the stored copy.
    pub async fn clear(&mut self) {
        self.dispatch(CartAction::Clear).await;
    }

    /// Consume the store, keeping the cart.
    #[must_use]
    pub fn into_cart(self) -> Cart {
        self.cart
    }

    async fn persist(&self) {
        if let Err(e) = self
            .storage
            .set_item(session_keys::CART, &self.cart.lines())
            .await
        {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.storage.remove_item(session_keys::CART).await {
            tracing::warn!(error = %e, "Failed to remove stored cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use navdana_core::{LineKey, NewLine, ProductId};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::services::storage::MemoryStorage;

    fn p1(size: &str) -> NewLine {
        NewLine {
            product_id: ProductId::new("P1"),
            size: Some(size.to_string()),
            color: Some("#000".to_string()),
            sku: None,
            name: "Kurta".to_string(),
            price: Decimal::new(500, 0),
            image: "/img/p1.jpg".to_string(),
        }
    }

    fn add(line: NewLine) -> CartAction {
        CartAction::Add {
            line,
            quantity: None,
        }
    }

    #[tokio::test]
    async fn test_empty_storage_loads_empty_cart() {
        let store = CartStore::load(MemoryStorage::new()).await;
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_every_dispatch_writes_full_snapshot() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::load(storage.clone()).await;

        store.dispatch(add(p1("M"))).await;
        store.dispatch(add(p1("L"))).await;

        let raw = storage.raw(session_keys::CART).unwrap();
        let lines = raw.as_array().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["_id"], "P1");
        assert_eq!(lines[1]["size"], "L");
    }

    #[tokio::test]
    async fn test_increment_then_decrement_to_empty() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::load(storage.clone()).await;
        let key = LineKey::new("P1", Some("M"), Some("#000"), None);

        store.dispatch(add(p1("M"))).await;
        let cart = store.dispatch(CartAction::Increment(key.clone())).await;
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Decimal::new(1000, 0));

        store.dispatch(CartAction::Decrement(key.clone())).await;
        let cart = store.dispatch(CartAction::Decrement(key)).await;
        assert!(cart.is_empty());
        assert_eq!(storage.raw(session_keys::CART), Some(json!([])));
    }

    #[tokio::test]
    async fn test_clear_removes_stored_copy() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::load(storage.clone()).await;
        store.dispatch(add(p1("M"))).await;
        assert!(storage.raw(session_keys::CART).is_some());

        store.clear().await;
        assert!(store.cart().is_empty());
        assert!(storage.raw(session_keys::CART).is_none());
    }

    #[tokio::test]
    async fn test_reload_sees_previous_writes() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::load(storage.clone()).await;
        store.dispatch(add(p1("M"))).await;
        store.dispatch(add(p1("M"))).await;

        let reloaded = CartStore::load(storage).await;
        assert_eq!(reloaded.cart().lines().len(), 1);
        assert_eq!(reloaded.cart().total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        let mut store = CartStore::load(storage.clone()).await;

        let cart = store.dispatch(add(p1("M"))).await;
        assert_eq!(cart.total_quantity(), 1);
        assert!(storage.raw(session_keys::CART).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_discarded() {
        let storage = MemoryStorage::new();
        storage.put_raw(session_keys::CART, json!({"items": "nope"}));
        let store = CartStore::load(storage).await;
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_snapshot_with_duplicates_is_normalized() {
        let storage = MemoryStorage::new();
        storage.put_raw(
            session_keys::CART,
            json!([
                {"id": "P1", "name": "Kurta", "price": "500", "quantity": 1, "image": ""},
                {"_id": "P1", "size": "", "name": "Kurta", "price": "500", "quantity": 2, "image": ""},
                {"_id": "P2", "name": "Dupatta", "price": "300", "quantity": 0, "image": ""}
            ]),
        );
        let store = CartStore::load(storage).await;
        assert_eq!(store.cart().lines().len(), 1);
        assert_eq!(store.cart().total_quantity(), 3);
    }
}
