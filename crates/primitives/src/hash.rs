//! Keccak-256 hashing, the digest used for swap identifiers, attestations and addresses.

use sha3::{Digest, Keccak256};

/// Computes the keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// Computes the keccak-256 digest of the concatenation of all `parts` without allocating the
/// concatenated buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }

    hasher.finalize().into()
}
