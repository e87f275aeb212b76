//! keylink - keypair-based API authentication
//!
//! Devices hold Ed25519 keypairs and sign every request; the server stores
//! only public keys. A registered device can issue single-use linking tokens
//! that let another device bind its own key to the same identity.
//!
//! # Modules
//!
//! - [`auth`] - Codec, verifier, replay guard, key registry, tokens and the gateway
//! - [`api`] - axum routes over the gateway
//! - [`db`] - PostgreSQL pool and schema
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;

// Convenient re-exports at crate root
pub use auth::{
    AuthContext, AuthError, AuthOutcome, AuthenticatedIdentity, AuthenticationGateway, IdentityId,
    KeyRegistry, KeyStore, TokenIssuer,
};
pub use config::AppConfig;
