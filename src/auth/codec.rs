//! base58btc codec for public keys, signatures and linking tokens.
//!
//! Every header value except the timer travels in this encoding. Input is
//! checked against the Bitcoin alphabet before any cryptographic work so
//! malformed values never reach the verifier.

use thiserror::Error;

/// The base58btc (Bitcoin) alphabet.
pub const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Wire encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("empty base58btc string")]
    Empty,

    #[error("invalid base58btc character {ch:?} at position {index}")]
    InvalidCharacter { ch: char, index: usize },

    #[error("non-canonical base58btc encoding")]
    NonCanonical,
}

/// Encode raw bytes as base58btc.
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base58btc string.
///
/// Rejects empty input, characters outside [`ALPHABET`], and strings that do
/// not round-trip through `encode(decode(s)) == s`.
pub fn decode(s: &str) -> Result<Vec<u8>, FormatError> {
    if s.is_empty() {
        return Err(FormatError::Empty);
    }

    if let Some((index, ch)) = s.chars().enumerate().find(|(_, c)| !ALPHABET.contains(*c)) {
        return Err(FormatError::InvalidCharacter { ch, index });
    }

    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|_| FormatError::NonCanonical)?;

    if encode(&bytes) != s {
        return Err(FormatError::NonCanonical);
    }

    Ok(bytes)
}

/// Non-failing pre-filter used before signature verification.
pub fn is_valid(s: &str) -> bool {
    decode(s).is_ok()
}
