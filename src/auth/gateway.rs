//! Request authentication gateway.
//!
//! Each request walks a fixed sequence of stages:
//!
//! ```text
//! Unauthenticated -> FormatChecked -> ReplayChecked -> SignatureChecked -> Resolved
//! ```
//!
//! A failed transition ends the request with an [`AuthError`]; stages are
//! never retried or partially applied. Key-linking requests stop after
//! `SignatureChecked` and redeem a token instead of resolving the key.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::clock::Clock;
use super::envelope::{AuthHeaders, Envelope, SignedEnvelope, signing_payload};
use super::error::AuthError;
use super::models::{AuthOutcome, AuthenticatedIdentity, KeyBinding, short};
use super::registry::KeyRegistry;
use super::replay::{ReplayGuard, ReplayRejection};
use super::signature::verify_ed25519;
use super::tokens::TokenIssuer;

/// Gateway stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unauthenticated,
    FormatChecked,
    ReplayChecked,
    SignatureChecked,
    Resolved,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Unauthenticated => "unauthenticated",
            Stage::FormatChecked => "format_checked",
            Stage::ReplayChecked => "replay_checked",
            Stage::SignatureChecked => "signature_checked",
            Stage::Resolved => "resolved",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the signature stages (1-3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verified {
    FirstContact { public_key: String },
    /// Both signatures verified under `public_key`
    Signed { public_key: String },
}

/// Orchestrates codec, replay guard, verifier and registry.
pub struct AuthenticationGateway {
    registry: Arc<KeyRegistry>,
    tokens: Arc<TokenIssuer>,
    replay: ReplayGuard,
    clock: Arc<dyn Clock>,
}

impl AuthenticationGateway {
    pub fn new(
        registry: Arc<KeyRegistry>,
        tokens: Arc<TokenIssuer>,
        replay: ReplayGuard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            tokens,
            replay,
            clock,
        }
    }

    /// Authenticate a request and resolve its identity.
    ///
    /// `body` must be the exact bytes received; an empty body is verified
    /// against the literal `{}`.
    pub async fn authenticate(
        &self,
        headers: &AuthHeaders,
        body: &[u8],
    ) -> Result<AuthOutcome, AuthError> {
        let public_key = match self.verify(headers, body)? {
            Verified::FirstContact { public_key } => {
                debug!(key = short(&public_key), "First contact without signature");
                return Ok(AuthOutcome::NewIdentity { public_key });
            }
            Verified::Signed { public_key } => public_key,
        };

        let identity = self
            .registry
            .resolve(&public_key)
            .await?
            .ok_or_else(|| reject(Stage::SignatureChecked, AuthError::UnknownKey))?;

        debug!(identity = %identity, stage = %Stage::Resolved, "Request authenticated");
        Ok(AuthOutcome::Authenticated(AuthenticatedIdentity {
            identity,
            public_key,
        }))
    }

    /// Like [`authenticate`](Self::authenticate) but first contact counts as
    /// an unknown key.
    pub async fn require_identity(
        &self,
        headers: &AuthHeaders,
        body: &[u8],
    ) -> Result<AuthenticatedIdentity, AuthError> {
        match self.authenticate(headers, body).await? {
            AuthOutcome::Authenticated(id) => Ok(id),
            AuthOutcome::NewIdentity { .. } => Err(AuthError::UnknownKey),
        }
    }

    /// Verify a key-linking request and redeem `token` for the signing key.
    ///
    /// The signing key does not need to be registered; that is the point.
    pub async fn link_key(
        &self,
        headers: &AuthHeaders,
        body: &[u8],
        token: &str,
    ) -> Result<KeyBinding, AuthError> {
        let public_key = self.require_signed(headers, body)?;
        self.tokens.redeem_and_bind(token, &public_key).await
    }

    /// Run stages 1-3 and require a signature.
    ///
    /// Returns the verified base58btc public key.
    pub fn require_signed(&self, headers: &AuthHeaders, body: &[u8]) -> Result<String, AuthError> {
        match self.verify(headers, body)? {
            Verified::Signed { public_key } => Ok(public_key),
            Verified::FirstContact { .. } => Err(reject(
                Stage::Unauthenticated,
                AuthError::format("Missing X-Signature"),
            )),
        }
    }

    /// Run stages 1-3 without touching storage.
    pub fn verify(&self, headers: &AuthHeaders, body: &[u8]) -> Result<Verified, AuthError> {
        let envelope = match Envelope::parse(headers) {
            Ok(Envelope::Signed(env)) => env,
            Ok(Envelope::FirstContact { public_key }) => {
                return Ok(Verified::FirstContact { public_key });
            }
            Err(e) => return Err(reject(Stage::Unauthenticated, e)),
        };

        self.check_replay(&envelope)
            .map_err(|e| reject(Stage::FormatChecked, e))?;

        if !verify_ed25519(
            &envelope.public_key,
            signing_payload(body),
            &envelope.signature,
        ) {
            return Err(reject(Stage::ReplayChecked, AuthError::SignatureInvalid));
        }

        Ok(Verified::Signed {
            public_key: envelope.public_key_text,
        })
    }

    fn check_replay(&self, envelope: &SignedEnvelope) -> Result<(), AuthError> {
        let timer_signature = envelope
            .timer_signature
            .as_deref()
            .ok_or(AuthError::Replay(ReplayRejection::Missing))?;

        match self.replay.check_timer(
            envelope.timer.as_deref(),
            timer_signature,
            &envelope.public_key,
            self.clock.now_ms(),
        ) {
            Ok(_) => Ok(()),
            // Timer and body signature failures are reported identically
            Err(ReplayRejection::BadSignature) => Err(AuthError::SignatureInvalid),
            Err(reason) => Err(AuthError::Replay(reason)),
        }
    }
}

fn reject(stage: Stage, err: AuthError) -> AuthError {
    debug!(stage = %stage, code = err.code(), reason = %err, "Request rejected");
    err
}
