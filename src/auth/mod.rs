//! Keypair-based request authentication.
//!
//! Clients sign every request body and a millisecond timer with an Ed25519
//! key. The server keeps no secrets: it only stores which public keys belong
//! to which identity, plus short-lived tokens used to link extra keys.
//!
//! ## Components
//! - `codec`: base58btc text encoding for keys, signatures and tokens
//! - `signature`: Ed25519 verification
//! - `replay`: signed-timer freshness check
//! - `envelope`: header extraction and format validation
//! - `registry`: public key to identity bindings
//! - `tokens`: single-use linking tokens
//! - `gateway`: the verification pipeline tying the above together
//! - `registration`: named identity creation
//! - `store` / `memory` / `repository`: storage seam and its backends

pub mod clock;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod registration;
pub mod registry;
pub mod replay;
pub mod repository;
pub mod signature;
pub mod store;
pub mod tokens;

use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{AuthHeaders, Envelope, SignedEnvelope};
pub use error::AuthError;
pub use gateway::{AuthenticationGateway, Stage, Verified};
pub use memory::MemoryStore;
pub use models::{AuthOutcome, AuthenticatedIdentity, IdentityId, KeyBinding, LinkingToken};
pub use registration::{Registered, Registrar};
pub use registry::KeyRegistry;
pub use replay::{ReplayGuard, ReplayRejection};
pub use repository::PgKeyStore;
pub use signature::verify_ed25519;
pub use store::{KeyStore, Redemption, Registration, StoreError};
pub use tokens::TokenIssuer;

use crate::config::AuthConfig;

/// Every auth component wired over one store and one clock.
#[derive(Clone)]
pub struct AuthContext {
    pub registry: Arc<KeyRegistry>,
    pub tokens: Arc<TokenIssuer>,
    pub gateway: Arc<AuthenticationGateway>,
    pub registrar: Arc<Registrar>,
    store_name: &'static str,
}

impl AuthContext {
    pub fn new(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>, settings: &AuthConfig) -> Self {
        let registry = Arc::new(KeyRegistry::new(store.clone()));
        let tokens = Arc::new(TokenIssuer::new(
            store.clone(),
            clock.clone(),
            settings.token_ttl_secs,
        ));
        let gateway = Arc::new(AuthenticationGateway::new(
            registry.clone(),
            tokens.clone(),
            ReplayGuard::new(settings.replay_window_ms),
            clock,
        ));
        let registrar = Arc::new(Registrar::new(store.clone()));

        Self {
            registry,
            tokens,
            gateway,
            registrar,
            store_name: store.name(),
        }
    }

    /// In-memory store with the system clock.
    pub fn in_memory(settings: &AuthConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), settings)
    }

    pub fn store_name(&self) -> &'static str {
        self.store_name
    }
}
