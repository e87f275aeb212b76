//! Name registration: creates an identity bound to its first key.

use std::sync::Arc;
use tracing::info;

use super::error::AuthError;
use super::models::{IdentityId, short};
use super::store::{KeyStore, Registration};

/// Longest accepted identity name.
pub const MAX_NAME_LEN: usize = 64;

/// Outcome of a registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Created(IdentityId),
    /// Name already registered with this very key; nothing changed
    Existing(IdentityId),
}

impl Registered {
    pub fn identity(self) -> IdentityId {
        match self {
            Registered::Created(id) | Registered::Existing(id) => id,
        }
    }
}

/// Names are 1-64 ASCII alphanumerics.
pub fn validate_name(name: &str) -> Result<(), AuthError> {
    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || !name.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(AuthError::InvalidName);
    }
    Ok(())
}

pub struct Registrar {
    store: Arc<dyn KeyStore>,
}

impl Registrar {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Register `name` with an already verified `public_key`.
    pub async fn register(&self, name: &str, public_key: &str) -> Result<Registered, AuthError> {
        validate_name(name)?;

        match self.store.create_identity_with_key(name, public_key).await? {
            Registration::Created(identity) => {
                info!(identity = %identity, name, key = short(public_key), "Identity registered");
                Ok(Registered::Created(identity))
            }
            Registration::AlreadyRegistered(identity) => Ok(Registered::Existing(identity)),
            Registration::NameTaken => Err(AuthError::NameTaken),
            Registration::KeyAlreadyBound => Err(AuthError::DuplicateBinding),
        }
    }

    /// Registered name of an identity.
    pub async fn profile(&self, identity: IdentityId) -> Result<String, AuthError> {
        self.store
            .find_name(identity)
            .await?
            .ok_or(AuthError::UnknownKey)
    }

    /// Whether `name` is already registered.
    pub async fn name_exists(&self, name: &str) -> Result<bool, AuthError> {
        Ok(self.store.find_identity_by_name(name).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryStore;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("alice42").is_ok());
        assert!(validate_name(&"a".repeat(64)).is_ok());
        for bad in ["", "al ice", "alice!", "ålice", "a_b"] {
            assert_eq!(validate_name(bad), Err(AuthError::InvalidName), "{bad:?}");
        }
        assert_eq!(validate_name(&"a".repeat(65)), Err(AuthError::InvalidName));
    }

    #[tokio::test]
    async fn test_register_flow() {
        let registrar = Registrar::new(Arc::new(MemoryStore::new()));

        let created = registrar.register("alice", "KeyA").await.unwrap();
        assert!(matches!(created, Registered::Created(_)));
        assert_eq!(
            registrar.register("alice", "KeyA").await,
            Ok(Registered::Existing(created.identity()))
        );
        assert_eq!(
            registrar.register("alice", "KeyB").await,
            Err(AuthError::NameTaken)
        );
        assert_eq!(
            registrar.register("bob", "KeyA").await,
            Err(AuthError::DuplicateBinding)
        );
        assert_eq!(
            registrar.profile(created.identity()).await.as_deref(),
            Ok("alice")
        );
        assert!(registrar.name_exists("alice").await.unwrap());
        assert!(!registrar.name_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_of_unknown_identity() {
        let registrar = Registrar::new(Arc::new(MemoryStore::new()));
        assert_eq!(
            registrar.profile(IdentityId(99)).await,
            Err(AuthError::UnknownKey)
        );
    }
}
