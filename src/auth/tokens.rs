//! Single-use linking tokens.
//!
//! An authenticated identity issues a token, carries it to a new device, and
//! the new device redeems it while signing with its own key. Redemption binds
//! the new key and deletes the token in one storage transaction.

use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{debug, info};

use super::clock::Clock;
use super::codec;
use super::error::AuthError;
use super::models::{IdentityId, KeyBinding, LinkingToken, short};
use super::store::{KeyStore, Redemption};

/// Random bytes per token before encoding.
pub const TOKEN_BYTES: usize = 32;

/// Default token lifetime (5 minutes).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 300;

/// Issues, lists, revokes and redeems linking tokens.
pub struct TokenIssuer {
    store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            store,
            clock,
            ttl_ms: i64::try_from(ttl_secs)
                .unwrap_or(i64::MAX)
                .saturating_mul(1000),
        }
    }

    /// Issue a fresh token for `identity`.
    ///
    /// Several live tokens per identity are allowed.
    pub async fn issue(&self, identity: IdentityId) -> Result<LinkingToken, AuthError> {
        let token = generate_token();
        let expires_at = self.clock.now_ms().saturating_add(self.ttl_ms);
        let row = self.store.insert_token(identity, &token, expires_at).await?;
        info!(identity = %identity, token = short(&row.token), expires_at, "Linking token issued");
        Ok(row)
    }

    /// Consume `token` and bind `new_public_key` to the token's owner.
    ///
    /// Missing and expired tokens both fail with [`AuthError::TokenInvalid`].
    /// An already bound key fails with [`AuthError::DuplicateBinding`] and the
    /// token stays usable.
    pub async fn redeem_and_bind(
        &self,
        token: &str,
        new_public_key: &str,
    ) -> Result<KeyBinding, AuthError> {
        if !codec::is_valid(token) {
            return Err(AuthError::TokenInvalid);
        }

        let now_ms = self.clock.now_ms();
        match self.store.redeem_token(token, new_public_key, now_ms).await? {
            Redemption::Bound(binding) => {
                info!(
                    identity = %binding.identity,
                    key = short(new_public_key),
                    "Key linked via token"
                );
                Ok(binding)
            }
            Redemption::TokenInvalid => {
                debug!(token = short(token), "Token redemption refused");
                Err(AuthError::TokenInvalid)
            }
            Redemption::KeyAlreadyBound => {
                debug!(key = short(new_public_key), "Token redemption with bound key");
                Err(AuthError::DuplicateBinding)
            }
        }
    }

    /// Live tokens of `identity` in issuance order. Expired ones are purged.
    pub async fn list_live(&self, identity: IdentityId) -> Result<Vec<LinkingToken>, AuthError> {
        let now_ms = self.clock.now_ms();
        let purged = self.store.purge_expired_tokens(identity, now_ms).await?;
        if purged > 0 {
            debug!(identity = %identity, purged, "Purged expired linking tokens");
        }

        let tokens = self.store.list_tokens(identity).await?;
        Ok(tokens.into_iter().filter(|t| t.is_live(now_ms)).collect())
    }

    /// Invalidate a token early. Returns `false` if it is already gone or
    /// belongs to another identity.
    pub async fn revoke(&self, identity: IdentityId, token: &str) -> Result<bool, AuthError> {
        let removed = self.store.delete_identity_token(identity, token).await?;
        if removed > 0 {
            info!(identity = %identity, token = short(token), "Linking token revoked");
        }
        Ok(removed > 0)
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }
}

/// 32 bytes from the OS CSPRNG, base58btc encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    codec::encode(&bytes)
}
