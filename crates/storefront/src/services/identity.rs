//! The buyer's verified identity.
//!
//! `user` and `token` are written together, only by [`SessionIdentity::set_identity`]
//! after a successful OTP verification. Everything else reads them.

use secrecy::SecretString;

use crate::models::{StoredUser, session_keys};
use crate::services::storage::{ClientStorage, StorageError};

/// Owner of the `user` / `token` storage keys.
pub struct SessionIdentity<S> {
    storage: S,
}

impl<S: ClientStorage> SessionIdentity<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The verified buyer, if any. Unreadable values count as absent.
    pub async fn user(&self) -> Option<StoredUser> {
        self.storage
            .get_item::<StoredUser>(session_keys::USER)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Unreadable stored user"))
            .ok()
            .flatten()
    }

    /// The bearer token, if any. An empty token counts as absent.
    pub async fn token(&self) -> Option<SecretString> {
        self.storage
            .get_item::<String>(session_keys::TOKEN)
            .await
            .ok()
            .flatten()
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    /// Whether a buyer has verified in this session.
    pub async fn is_known(&self) -> bool {
        self.user().await.is_some()
    }

    /// Record a freshly verified identity.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if either key cannot be written. The token
    /// goes in first and is taken back out if the user cannot follow, so a
    /// stored user always has its token.
    pub async fn set_identity(&self, user: &StoredUser, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(session_keys::TOKEN, &token).await?;
        if let Err(e) = self.storage.set_item(session_keys::USER, user).await {
            if let Err(cleanup) = self.storage.remove_item(session_keys::TOKEN).await {
                tracing::warn!(error = %cleanup, "Could not remove orphaned token");
            }
            return Err(e);
        }
        tracing::info!(user_id = %user.id, "Buyer identity stored");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use navdana_core::UserId;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::services::storage::MemoryStorage;

    #[tokio::test]
    async fn test_empty_session_has_no_identity() {
        let identity = SessionIdentity::new(MemoryStorage::new());
        assert!(!identity.is_known().await);
        assert!(identity.token().await.is_none());
    }

    #[tokio::test]
    async fn test_set_identity_writes_both_keys() {
        let storage = MemoryStorage::new();
        let identity = SessionIdentity::new(storage.clone());
        let user = StoredUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
        };

        identity.set_identity(&user, "tok_1").await.unwrap();

        assert_eq!(identity.user().await, Some(user));
        assert_eq!(identity.token().await.unwrap().expose_secret(), "tok_1");
        assert_eq!(storage.raw(session_keys::TOKEN).unwrap(), "tok_1");
        assert_eq!(storage.raw(session_keys::USER).unwrap()["_id"], "u1");
    }

    #[tokio::test]
    async fn test_failed_user_write_leaves_no_token() {
        let storage = MemoryStorage::new();
        storage.fail_writes_to(session_keys::USER);
        let identity = SessionIdentity::new(storage.clone());
        let user = StoredUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
        };

        assert!(identity.set_identity(&user, "tok_1").await.is_err());
        assert!(!identity.is_known().await);
        assert!(identity.token().await.is_none());
        assert!(storage.raw(session_keys::TOKEN).is_none());
    }

    #[tokio::test]
    async fn test_failed_token_write_leaves_no_user() {
        let storage = MemoryStorage::new();
        storage.fail_writes_to(session_keys::TOKEN);
        let identity = SessionIdentity::new(storage.clone());
        let user = StoredUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
        };

        assert!(identity.set_identity(&user, "tok_1").await.is_err());
        assert!(storage.raw(session_keys::USER).is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_absent() {
        let storage = MemoryStorage::new();
        storage.put_raw(session_keys::TOKEN, serde_json::json!(""));
        assert!(SessionIdentity::new(storage).token().await.is_none());
    }
}
