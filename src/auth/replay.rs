//! Replay protection via a signed timer.
//!
//! Clients send their current epoch-millisecond time in `X-Timer` together
//! with a signature over that exact string. A request is accepted only when
//! the timer is within the acceptance window of server time and the timer
//! signature verifies under the request's public key. No per-key state is kept
//! on the server.

use thiserror::Error;

use super::signature::verify_ed25519;

/// Default acceptance window (60 seconds either side of server time).
pub const DEFAULT_REPLAY_WINDOW_MS: u64 = 60_000;

/// Why a timer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayRejection {
    #[error("missing timer or timer signature")]
    Missing,

    #[error("timer is not an epoch millisecond integer")]
    Malformed,

    #[error("timer outside the acceptance window")]
    OutOfWindow,

    #[error("timer signature verification failed")]
    BadSignature,
}

/// Checks signed timers against a fixed acceptance window.
#[derive(Debug, Clone, Copy)]
pub struct ReplayGuard {
    window_ms: u64,
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW_MS)
    }
}

impl ReplayGuard {
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Validate a timer and its signature.
    ///
    /// Returns the parsed timer on success. The window is inclusive:
    /// `|now - timer| == window` is accepted.
    pub fn check_timer(
        &self,
        timer: Option<&str>,
        timer_signature: &[u8],
        public_key: &[u8],
        now_ms: i64,
    ) -> Result<i64, ReplayRejection> {
        let timer_str = timer.ok_or(ReplayRejection::Missing)?;
        let timer_ms = parse_timer(timer_str)?;

        if now_ms.abs_diff(timer_ms) > self.window_ms {
            return Err(ReplayRejection::OutOfWindow);
        }

        if !verify_ed25519(public_key, timer_str.as_bytes(), timer_signature) {
            return Err(ReplayRejection::BadSignature);
        }

        Ok(timer_ms)
    }
}

/// Timers are plain ASCII digits; signs, whitespace and decimals are refused
/// so the signed string has exactly one textual form.
fn parse_timer(timer: &str) -> Result<i64, ReplayRejection> {
    if timer.is_empty() || !timer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReplayRejection::Malformed);
    }
    timer.parse::<i64>().map_err(|_| ReplayRejection::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::signature::test_keys::{generate, sign};

    const NOW: i64 = 1_766_416_500_000;

    fn signed_timer(timer: i64) -> (String, [u8; 64], [u8; 32]) {
        let key = generate();
        let timer = timer.to_string();
        let sig = sign(&key, timer.as_bytes());
        (timer, sig, key.verifying_key().to_bytes())
    }

    #[test]
    fn test_fresh_timer_accepted() {
        let guard = ReplayGuard::default();
        let (timer, sig, pk) = signed_timer(NOW);
        assert_eq!(guard.check_timer(Some(&timer), &sig, &pk, NOW), Ok(NOW));
    }

    #[test]
    fn test_window_boundaries() {
        let guard = ReplayGuard::default();
        for (offset, accepted) in [
            (60_000, true),
            (-60_000, true),
            (60_001, false),
            (-60_001, false),
        ] {
            let (timer, sig, pk) = signed_timer(NOW + offset);
            let result = guard.check_timer(Some(&timer), &sig, &pk, NOW);
            if accepted {
                assert!(result.is_ok(), "offset {offset} should be accepted");
            } else {
                assert_eq!(result, Err(ReplayRejection::OutOfWindow), "offset {offset}");
            }
        }
    }

    #[test]
    fn test_stale_timer_rejected() {
        let guard = ReplayGuard::default();
        let (timer, sig, pk) = signed_timer(NOW - 120_000);
        assert_eq!(
            guard.check_timer(Some(&timer), &sig, &pk, NOW),
            Err(ReplayRejection::OutOfWindow)
        );
    }

    #[test]
    fn test_missing_timer() {
        let guard = ReplayGuard::default();
        let (_, sig, pk) = signed_timer(NOW);
        assert_eq!(
            guard.check_timer(None, &sig, &pk, NOW),
            Err(ReplayRejection::Missing)
        );
    }

    #[test]
    fn test_malformed_timer() {
        let guard = ReplayGuard::default();
        let (_, sig, pk) = signed_timer(NOW);
        for bad in ["", "abc", "1.5", "-1", "+1766416500000", " 1766416500000", "99999999999999999999"] {
            assert_eq!(
                guard.check_timer(Some(bad), &sig, &pk, NOW),
                Err(ReplayRejection::Malformed),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_unsigned_or_foreign_signature_rejected() {
        let guard = ReplayGuard::default();
        let (timer, _, pk) = signed_timer(NOW);
        let (_, foreign_sig, _) = signed_timer(NOW);

        assert_eq!(
            guard.check_timer(Some(&timer), &[0u8; 64], &pk, NOW),
            Err(ReplayRejection::BadSignature)
        );
        assert_eq!(
            guard.check_timer(Some(&timer), &foreign_sig, &pk, NOW),
            Err(ReplayRejection::BadSignature)
        );
    }

    #[test]
    fn test_signature_bound_to_exact_string() {
        let guard = ReplayGuard::default();
        let key = generate();
        let sig = sign(&key, b"1766416500000");
        let pk = key.verifying_key().to_bytes();

        // Same value, different text
        assert_eq!(
            guard.check_timer(Some("01766416500000"), &sig, &pk, NOW),
            Err(ReplayRejection::BadSignature)
        );
    }

    #[test]
    fn test_custom_window() {
        let guard = ReplayGuard::new(1_000);
        let (timer, sig, pk) = signed_timer(NOW - 1_500);
        assert_eq!(
            guard.check_timer(Some(&timer), &sig, &pk, NOW),
            Err(ReplayRejection::OutOfWindow)
        );
        assert_eq!(guard.window_ms(), 1_000);
    }
}
