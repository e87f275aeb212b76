//! Request signing headers and the decoded envelope.
//!
//! Wire contract:
//! - `X-Public-Key`: base58btc Ed25519 public key
//! - `X-Signature`: base58btc signature over the exact body bytes (`{}` when empty)
//! - `X-Timer`: epoch milliseconds as decimal text
//! - `X-Timer-Signature`: base58btc signature over the `X-Timer` text

use axum::http::HeaderMap;
use ed25519_dalek::{Signer, SigningKey};

use super::codec;
use super::error::AuthError;

pub const HEADER_PUBLIC_KEY: &str = "x-public-key";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_TIMER: &str = "x-timer";
pub const HEADER_TIMER_SIGNATURE: &str = "x-timer-signature";

/// Payload signed for requests without a body, so GET and POST share one
/// signing convention.
pub const EMPTY_BODY_PAYLOAD: &[u8] = b"{}";

/// The bytes a body signature covers.
pub fn signing_payload(body: &[u8]) -> &[u8] {
    if body.is_empty() {
        EMPTY_BODY_PAYLOAD
    } else {
        body
    }
}

/// Raw authentication headers as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    pub public_key: Option<String>,
    pub signature: Option<String>,
    pub timer: Option<String>,
    pub timer_signature: Option<String>,
}

impl AuthHeaders {
    /// Extract the four headers. Values that are not visible ASCII are
    /// treated as absent.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            public_key: get(HEADER_PUBLIC_KEY),
            signature: get(HEADER_SIGNATURE),
            timer: get(HEADER_TIMER),
            timer_signature: get(HEADER_TIMER_SIGNATURE),
        }
    }

    /// Build signed headers for `body` with the caller's keypair.
    ///
    /// The keypair is always passed in explicitly; nothing is cached.
    pub fn sign(signing_key: &SigningKey, body: &[u8], timer_ms: i64) -> Self {
        let timer = timer_ms.to_string();
        let signature = signing_key.sign(signing_payload(body));
        let timer_signature = signing_key.sign(timer.as_bytes());
        Self {
            public_key: Some(codec::encode(signing_key.verifying_key().as_bytes())),
            signature: Some(codec::encode(&signature.to_bytes())),
            timer: Some(timer),
            timer_signature: Some(codec::encode(&timer_signature.to_bytes())),
        }
    }

    /// Present headers as (name, value) pairs.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            (HEADER_PUBLIC_KEY, &self.public_key),
            (HEADER_SIGNATURE, &self.signature),
            (HEADER_TIMER, &self.timer),
            (HEADER_TIMER_SIGNATURE, &self.timer_signature),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Decoded, format-checked request. No identity is attached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// base58btc text as sent, used for registry lookups
    pub public_key_text: String,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
    pub timer: Option<String>,
    pub timer_signature: Option<Vec<u8>>,
}

/// Result of the format stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Public key without a signature
    FirstContact { public_key: String },
    Signed(SignedEnvelope),
}

impl Envelope {
    /// Check presence and encoding of every header.
    pub fn parse(headers: &AuthHeaders) -> Result<Self, AuthError> {
        let public_key_text = headers
            .public_key
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::format("Missing X-Public-Key"))?;

        let public_key = codec::decode(public_key_text)
            .map_err(|_| AuthError::format("Invalid public key format"))?;

        let Some(signature_text) = headers.signature.as_deref().filter(|v| !v.is_empty()) else {
            return Ok(Envelope::FirstContact {
                public_key: public_key_text.to_string(),
            });
        };

        let signature = codec::decode(signature_text)
            .map_err(|_| AuthError::format("Invalid signature format"))?;

        let timer_signature = match headers.timer_signature.as_deref() {
            None | Some("") => None,
            Some(text) => Some(
                codec::decode(text)
                    .map_err(|_| AuthError::format("Invalid signature format"))?,
            ),
        };

        Ok(Envelope::Signed(SignedEnvelope {
            public_key_text: public_key_text.to_string(),
            public_key,
            signature,
            timer: headers.timer.clone().filter(|v| !v.is_empty()),
            timer_signature,
        }))
    }
}
