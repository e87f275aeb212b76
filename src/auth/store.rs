//! Storage seam for identities, key bindings and linking tokens.
//!
//! Two invariants must be enforced by implementations, not by callers:
//! - a public key is bound to at most one identity (storage-level uniqueness)
//! - [`KeyStore::redeem_token`] deletes the token and inserts the binding as
//!   one all-or-nothing step

use async_trait::async_trait;
use thiserror::Error;

use super::models::{IdentityId, KeyBinding, LinkingToken};

/// Storage layer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    /// Binding or token refers to an identity that does not exist
    #[error("identity does not exist")]
    MissingIdentity,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::MissingIdentity
            }
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

/// Result of the transactional redeem-and-bind step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// Binding created, token deleted
    Bound(KeyBinding),
    /// No live token with that value (never issued, consumed, revoked or expired)
    TokenInvalid,
    /// The key is already bound; the token was left untouched
    KeyAlreadyBound,
}

/// Result of creating an identity together with its first key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created(IdentityId),
    /// Name and key already belong to the same identity
    AlreadyRegistered(IdentityId),
    NameTaken,
    KeyAlreadyBound,
}

/// Persistent store behind the key registry and token issuer.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn find_identity_by_key(&self, public_key: &str)
    -> Result<Option<IdentityId>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] if the key is bound to any identity.
    async fn insert_key_binding(
        &self,
        identity: IdentityId,
        public_key: &str,
    ) -> Result<KeyBinding, StoreError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_key_binding(
        &self,
        identity: IdentityId,
        public_key: &str,
    ) -> Result<u64, StoreError>;

    /// Bindings of an identity in insertion order.
    async fn list_key_bindings(&self, identity: IdentityId)
    -> Result<Vec<KeyBinding>, StoreError>;

    async fn insert_token(
        &self,
        identity: IdentityId,
        token: &str,
        expires_at: i64,
    ) -> Result<LinkingToken, StoreError>;

    /// Looks a token up regardless of expiry.
    async fn find_token(&self, token: &str) -> Result<Option<LinkingToken>, StoreError>;

    async fn delete_token(&self, token: &str) -> Result<u64, StoreError>;

    /// Deletes a token only if it belongs to `identity`.
    async fn delete_identity_token(
        &self,
        identity: IdentityId,
        token: &str,
    ) -> Result<u64, StoreError>;

    /// Tokens of an identity in issuance order, expired ones included.
    async fn list_tokens(&self, identity: IdentityId) -> Result<Vec<LinkingToken>, StoreError>;

    /// Removes tokens of `identity` with `expires_at <= now_ms`.
    async fn purge_expired_tokens(
        &self,
        identity: IdentityId,
        now_ms: i64,
    ) -> Result<u64, StoreError>;

    /// Atomically consume a live token and bind `public_key` to its owner.
    async fn redeem_token(
        &self,
        token: &str,
        public_key: &str,
        now_ms: i64,
    ) -> Result<Redemption, StoreError>;

    /// Create a named identity bound to its first key in one step.
    async fn create_identity_with_key(
        &self,
        name: &str,
        public_key: &str,
    ) -> Result<Registration, StoreError>;

    async fn find_identity_by_name(&self, name: &str) -> Result<Option<IdentityId>, StoreError>;

    async fn find_name(&self, identity: IdentityId) -> Result<Option<String>, StoreError>;
}
