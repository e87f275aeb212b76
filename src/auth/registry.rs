//! Public key to identity registry.

use std::sync::Arc;
use tracing::{debug, info};

use super::error::AuthError;
use super::models::{IdentityId, KeyBinding, short};
use super::store::KeyStore;

/// Owns every read and write of key bindings.
pub struct KeyRegistry {
    store: Arc<dyn KeyStore>,
}

impl KeyRegistry {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Exact-match lookup of the identity owning `public_key`.
    pub async fn resolve(&self, public_key: &str) -> Result<Option<IdentityId>, AuthError> {
        Ok(self.store.find_identity_by_key(public_key).await?)
    }

    /// Bind a key to an identity.
    ///
    /// Fails with [`AuthError::DuplicateBinding`] if the key is bound to any
    /// identity, including `identity` itself. Uniqueness is enforced by the
    /// store, so concurrent binds of one key yield exactly one success.
    pub async fn bind(
        &self,
        identity: IdentityId,
        public_key: &str,
    ) -> Result<KeyBinding, AuthError> {
        let binding = self.store.insert_key_binding(identity, public_key).await?;
        info!(identity = %identity, key = short(public_key), "Key bound");
        Ok(binding)
    }

    /// Revoke a binding on behalf of the key authenticating the request.
    ///
    /// A key can never revoke itself in the request it signs.
    pub async fn revoke(
        &self,
        identity: IdentityId,
        public_key: &str,
        acting_public_key: &str,
    ) -> Result<(), AuthError> {
        if public_key == acting_public_key {
            debug!(identity = %identity, "Refused self-revocation");
            return Err(AuthError::SelfRevocationDenied);
        }

        let removed = self.store.delete_key_binding(identity, public_key).await?;
        if removed == 0 {
            return Err(AuthError::BindingNotFound);
        }

        info!(identity = %identity, key = short(public_key), "Key revoked");
        Ok(())
    }

    /// Keys of an identity in insertion order.
    pub async fn list_keys(&self, identity: IdentityId) -> Result<Vec<String>, AuthError> {
        let bindings = self.store.list_key_bindings(identity).await?;
        Ok(bindings.into_iter().map(|b| b.public_key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryStore;
    use crate::auth::memory::test_support::seed_identity;

    fn registry() -> (KeyRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (KeyRegistry::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_bind_and_resolve() {
        let (reg, store) = registry();
        let alice = seed_identity(store.as_ref(), "alice", "Seed").await;

        let binding = reg.bind(alice, "KeyA").await.unwrap();
        assert_eq!(binding.identity, alice);
        assert_eq!(reg.resolve("KeyA").await.unwrap(), Some(alice));
        assert_eq!(reg.resolve("KeyB").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bind_unregistered_identity() {
        let (reg, _) = registry();
        assert!(matches!(
            reg.bind(IdentityId(999), "KeyZ").await,
            Err(AuthError::Storage(_))
        ));
        assert_eq!(reg.resolve("KeyZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_bind_always_fails() {
        let (reg, store) = registry();
        let alice = seed_identity(store.as_ref(), "alice", "KeyA").await;
        let bob = seed_identity(store.as_ref(), "bob", "KeyB").await;

        assert_eq!(reg.bind(alice, "KeyA").await, Err(AuthError::DuplicateBinding));
        assert_eq!(reg.bind(bob, "KeyA").await, Err(AuthError::DuplicateBinding));
    }

    #[tokio::test]
    async fn test_revoke_rules() {
        let (reg, store) = registry();
        let alice = seed_identity(store.as_ref(), "alice", "KeyA").await;
        reg.bind(alice, "KeyB").await.unwrap();

        assert_eq!(
            reg.revoke(alice, "KeyA", "KeyA").await,
            Err(AuthError::SelfRevocationDenied)
        );
        assert_eq!(reg.revoke(alice, "KeyB", "KeyA").await, Ok(()));
        assert_eq!(
            reg.revoke(alice, "KeyB", "KeyA").await,
            Err(AuthError::BindingNotFound)
        );
        assert_eq!(reg.list_keys(alice).await.unwrap(), vec!["KeyA"]);
    }

    #[tokio::test]
    async fn test_cannot_revoke_foreign_key() {
        let (reg, store) = registry();
        let alice = seed_identity(store.as_ref(), "alice", "KeyA").await;
        let bob = seed_identity(store.as_ref(), "bob", "KeyB").await;

        assert_eq!(
            reg.revoke(alice, "KeyB", "KeyA").await,
            Err(AuthError::BindingNotFound)
        );
        assert_eq!(reg.resolve("KeyB").await.unwrap(), Some(bob));
    }

    #[tokio::test]
    async fn test_concurrent_binds_single_winner() {
        let (reg, store) = registry();
        let reg = Arc::new(reg);
        let mut identities = Vec::new();
        for i in 0..16 {
            let name = format!("user{i}");
            identities.push(seed_identity(store.as_ref(), &name, &format!("Seed{i}")).await);
        }

        let mut handles = Vec::new();
        for identity in identities {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move {
                reg.bind(identity, "Contested").await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
