//! License key minting.

use uuid::Uuid;

/// Length of a minted license key.
pub const KEY_LENGTH: usize = 16;

/// Mint a new opaque license key.
///
/// The key is derived from a cryptographically random UUIDv4: separator-free
/// hex encoding, truncated to [`KEY_LENGTH`] characters, uppercased. The
/// store enforces uniqueness across purchases; callers treat a detected
/// collision as retryable by minting again.
#[must_use]
pub fn mint_key() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..KEY_LENGTH].to_ascii_uppercase()
}

/// Check whether a string has the shape of a license key.
///
/// Caller-supplied rotation keys are not required to pass this; it exists
/// for diagnostics and tests.
#[must_use]
pub fn is_key_format(key: &str) -> bool {
    key.len() == KEY_LENGTH
        && key
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}
