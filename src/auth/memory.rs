//! In-process [`KeyStore`].
//!
//! All tables live behind one mutex, so every trait method is a single
//! critical section: uniqueness checks and redeem-and-bind cannot interleave.
//! Used when no PostgreSQL URL is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::models::{IdentityId, KeyBinding, LinkingToken};
use super::store::{KeyStore, Redemption, Registration, StoreError};

#[derive(Default)]
struct Tables {
    next_identity: i64,
    next_seq: u64,
    names: HashMap<String, IdentityId>,
    identity_names: HashMap<IdentityId, String>,
    /// seq -> binding, seq gives insertion order
    bindings: BTreeMap<u64, KeyBinding>,
    binding_by_key: HashMap<String, u64>,
    /// seq -> token
    tokens: BTreeMap<u64, LinkingToken>,
    token_by_value: HashMap<String, u64>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn identity_of_key(&self, public_key: &str) -> Option<IdentityId> {
        self.binding_by_key
            .get(public_key)
            .and_then(|seq| self.bindings.get(seq))
            .map(|b| b.identity)
    }

    fn require_identity(&self, identity: IdentityId) -> Result<(), StoreError> {
        if self.identity_names.contains_key(&identity) {
            Ok(())
        } else {
            Err(StoreError::MissingIdentity)
        }
    }

    fn bind(&mut self, identity: IdentityId, public_key: &str) -> Result<KeyBinding, StoreError> {
        self.require_identity(identity)?;
        if self.binding_by_key.contains_key(public_key) {
            return Err(StoreError::UniqueViolation);
        }
        let binding = KeyBinding {
            identity,
            public_key: public_key.to_string(),
            created_at: Utc::now(),
        };
        let seq = self.next_seq();
        self.bindings.insert(seq, binding.clone());
        self.binding_by_key.insert(public_key.to_string(), seq);
        Ok(binding)
    }

    fn remove_token(&mut self, token: &str) -> u64 {
        match self.token_by_value.remove(token) {
            Some(seq) => {
                self.tokens.remove(&seq);
                1
            }
            None => 0,
        }
    }
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_identity_by_key(
        &self,
        public_key: &str,
    ) -> Result<Option<IdentityId>, StoreError> {
        Ok(self.tables()?.identity_of_key(public_key))
    }

    async fn insert_key_binding(
        &self,
        identity: IdentityId,
        public_key: &str,
    ) -> Result<KeyBinding, StoreError> {
        self.tables()?.bind(identity, public_key)
    }

    async fn delete_key_binding(
        &self,
        identity: IdentityId,
        public_key: &str,
    ) -> Result<u64, StoreError> {
        let mut t = self.tables()?;
        let Some(&seq) = t.binding_by_key.get(public_key) else {
            return Ok(0);
        };
        if t.bindings.get(&seq).map(|b| b.identity) != Some(identity) {
            return Ok(0);
        }
        t.bindings.remove(&seq);
        t.binding_by_key.remove(public_key);
        Ok(1)
    }

    async fn list_key_bindings(
        &self,
        identity: IdentityId,
    ) -> Result<Vec<KeyBinding>, StoreError> {
        Ok(self
            .tables()?
            .bindings
            .values()
            .filter(|b| b.identity == identity)
            .cloned()
            .collect())
    }

    async fn insert_token(
        &self,
        identity: IdentityId,
        token: &str,
        expires_at: i64,
    ) -> Result<LinkingToken, StoreError> {
        let mut t = self.tables()?;
        t.require_identity(identity)?;
        if t.token_by_value.contains_key(token) {
            return Err(StoreError::UniqueViolation);
        }
        let row = LinkingToken {
            token: token.to_string(),
            identity,
            expires_at,
        };
        let seq = t.next_seq();
        t.tokens.insert(seq, row.clone());
        t.token_by_value.insert(token.to_string(), seq);
        Ok(row)
    }

    async fn find_token(&self, token: &str) -> Result<Option<LinkingToken>, StoreError> {
        let t = self.tables()?;
        Ok(t.token_by_value
            .get(token)
            .and_then(|seq| t.tokens.get(seq))
            .cloned())
    }

    async fn delete_token(&self, token: &str) -> Result<u64, StoreError> {
        Ok(self.tables()?.remove_token(token))
    }

    async fn delete_identity_token(
        &self,
        identity: IdentityId,
        token: &str,
    ) -> Result<u64, StoreError> {
        let mut t = self.tables()?;
        let owned = t
            .token_by_value
            .get(token)
            .and_then(|seq| t.tokens.get(seq))
            .is_some_and(|row| row.identity == identity);
        if !owned {
            return Ok(0);
        }
        Ok(t.remove_token(token))
    }

    async fn list_tokens(&self, identity: IdentityId) -> Result<Vec<LinkingToken>, StoreError> {
        Ok(self
            .tables()?
            .tokens
            .values()
            .filter(|row| row.identity == identity)
            .cloned()
            .collect())
    }

    async fn purge_expired_tokens(
        &self,
        identity: IdentityId,
        now_ms: i64,
    ) -> Result<u64, StoreError> {
        let mut t = self.tables()?;
        let expired: Vec<String> = t
            .tokens
            .values()
            .filter(|row| row.identity == identity && !row.is_live(now_ms))
            .map(|row| row.token.clone())
            .collect();
        let mut removed = 0;
        for token in expired {
            removed += t.remove_token(&token);
        }
        Ok(removed)
    }

    async fn redeem_token(
        &self,
        token: &str,
        public_key: &str,
        now_ms: i64,
    ) -> Result<Redemption, StoreError> {
        let mut t = self.tables()?;

        let owner = t
            .token_by_value
            .get(token)
            .and_then(|seq| t.tokens.get(seq))
            .filter(|row| row.is_live(now_ms))
            .map(|row| row.identity);
        let Some(identity) = owner else {
            return Ok(Redemption::TokenInvalid);
        };

        if t.identity_of_key(public_key).is_some() {
            return Ok(Redemption::KeyAlreadyBound);
        }

        let binding = t.bind(identity, public_key)?;
        t.remove_token(token);
        Ok(Redemption::Bound(binding))
    }

    async fn create_identity_with_key(
        &self,
        name: &str,
        public_key: &str,
    ) -> Result<Registration, StoreError> {
        let mut t = self.tables()?;

        let name_owner = t.names.get(name).copied();
        let key_owner = t.identity_of_key(public_key);
        match (name_owner, key_owner) {
            (Some(n), Some(k)) if n == k => return Ok(Registration::AlreadyRegistered(n)),
            (Some(_), _) => return Ok(Registration::NameTaken),
            (None, Some(_)) => return Ok(Registration::KeyAlreadyBound),
            (None, None) => {}
        }

        t.next_identity += 1;
        let identity = IdentityId(t.next_identity);
        t.names.insert(name.to_string(), identity);
        t.identity_names.insert(identity, name.to_string());
        t.bind(identity, public_key)?;
        Ok(Registration::Created(identity))
    }

    async fn find_identity_by_name(&self, name: &str) -> Result<Option<IdentityId>, StoreError> {
        Ok(self.tables()?.names.get(name).copied())
    }

    async fn find_name(&self, identity: IdentityId) -> Result<Option<String>, StoreError> {
        Ok(self.tables()?.identity_names.get(&identity).cloned())
    }
}
