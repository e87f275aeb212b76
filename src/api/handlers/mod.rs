//! HTTP handlers
//!
//! Every authenticated handler takes the raw body as `Bytes` and hands it to
//! the gateway untouched; the signature covers those exact bytes.

pub mod health;
pub mod keys;
pub mod tokens;
pub mod users;

pub use health::health_check;
pub use keys::{link_key, list_keys, revoke_key};
pub use tokens::{issue_token, list_tokens, revoke_token};
pub use users::{check_name, profile, register};
