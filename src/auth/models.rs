//! Identity, key binding and linking token types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Opaque identifier of a registered identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityId(pub i64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A public key bound to an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub identity: IdentityId,
    /// base58btc-encoded Ed25519 public key, globally unique
    pub public_key: String,
    pub created_at: DateTime<Utc>,
}

/// Single-use credential that authorizes binding one more key to `identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingToken {
    pub token: String,
    #[serde(skip)]
    pub identity: IdentityId,
    /// Epoch milliseconds; the token is unusable at and after this instant
    pub expires_at: i64,
}

impl LinkingToken {
    pub fn is_live(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// Identity resolved from a fully verified request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub identity: IdentityId,
    /// The key that signed this request
    pub public_key: String,
}

/// Successful gateway outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AuthenticatedIdentity),
    /// Public key present without a signature: first contact from a device
    /// that has not registered yet.
    NewIdentity { public_key: String },
}

/// Shorten a key or token for log output.
pub fn short(value: &str) -> &str {
    match value.char_indices().nth(8) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
