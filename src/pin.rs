use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

// Keyed digest of the PIN. Fixed output length, and without the server-side
// secret a network observer cannot precompute a lookup table.
fn hash_pin(pin: &str, secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Constant-time PIN comparison. Both sides are hashed first so the
/// comparison always runs over the same number of bytes, and the byte
/// equality itself does not short-circuit on the first mismatch.
///
/// This gate provides no lockout of its own; brute-force resistance is
/// delegated entirely to the rate limiter in front of the endpoint.
pub fn verify_pin(supplied: &str, expected: &str, secret: &str) -> bool {
    let supplied_hash = hash_pin(supplied, secret);
    let expected_hash = hash_pin(expected, secret);
    supplied_hash
        .as_slice()
        .ct_eq(expected_hash.as_slice())
        .into()
}
