//! Deterministic secp256k1 accounts.

use bolt_bridge_primitives::{hash::keccak256, Address};
use k256::ecdsa::SigningKey;

/// The native asset used in tests.
pub const ETH: Address = bolt_bridge_primitives::constants::NATIVE_ASSET;

/// A signing key together with the address it controls.
#[derive(Debug, Clone)]
pub struct TestAccount {
    name: String,
    key: SigningKey,
    address: Address,
}

impl TestAccount {
    /// Derives the account for `name`.
    ///
    /// The secret key is the keccak-256 digest of the name, which is a valid scalar for every name
    /// used in practice.
    pub fn named(name: &str) -> Self {
        let key = SigningKey::from_slice(&keccak256(name.as_bytes()))
            .expect("digest must be a valid secret key");

        let point = key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);

        Self {
            name: name.to_string(),
            key,
            address: Address::new(address),
        }
    }

    /// The name the account was derived from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signing key.
    pub const fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// The address controlled by the key.
    pub const fn address(&self) -> Address {
        self.address
    }
}
