//! Relay attestations: the statement "operator X fulfilled swap S" signed by the swap's relayer.
//!
//! The signed digest is `keccak256(RELAY_MESSAGE_PREFIX ‖ swap_id ‖ operator)` and a signature is
//! the 65-byte `r ‖ s ‖ v` encoding with `v ∈ {27, 28}`. The digest is signed as-is, without any
//! further prefixing, so that signatures produced by common wallet tooling over the same preimage
//! recover to the same address on both networks.

use std::{fmt, str::FromStr};

use bolt_bridge_primitives::{
    hash::{keccak256, keccak256_concat},
    Address, SwapId,
};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The domain separator prepended to every relay attestation.
pub const RELAY_MESSAGE_PREFIX: &[u8] = b"\x19Bolt Signed Relay Message:\n64";

/// The offset added to the recovery id in the last byte of a signature.
const RECOVERY_FLAG_OFFSET: u8 = 27;

/// Errors that can occur while recovering the signer of a relay attestation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// The signature is not 65 bytes long.
    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    /// The last byte of the signature is neither 27 nor 28.
    #[error("invalid recovery flag {0}")]
    InvalidRecoveryFlag(u8),

    /// `r` or `s` is not a valid scalar.
    #[error("malformed signature")]
    MalformedSignature,

    /// No public key can be recovered from the signature over the digest.
    #[error("could not recover a public key")]
    Unrecoverable,

    /// The signature is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// A recoverable secp256k1 signature over a relay attestation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RelaySignature([u8; 65]);

impl RelaySignature {
    /// The length of an encoded signature.
    pub const LENGTH: usize = 65;

    /// Creates a signature from its `r ‖ s ‖ v` encoding without validating it.
    pub const fn new(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Returns the `r ‖ s ‖ v` encoding.
    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Returns the recovery flag (`v`).
    pub const fn recovery_flag(&self) -> u8 {
        self.0[64]
    }
}

impl TryFrom<&[u8]> for RelaySignature {
    type Error = RecoveryError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| RecoveryError::InvalidLength(value.len()))
    }
}

impl fmt::Display for RelaySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RelaySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelaySignature({self})")
    }
}

impl FromStr for RelaySignature {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| RecoveryError::InvalidHex(e.to_string()))?;

        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for RelaySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RelaySignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Computes the digest that a relayer signs to attest that `operator` fulfilled `swap_id`.
pub fn relay_digest(swap_id: &SwapId, operator: &Address) -> [u8; 32] {
    keccak256_concat(&[
        RELAY_MESSAGE_PREFIX,
        swap_id.as_bytes(),
        operator.as_bytes(),
    ])
}

/// Derives the address of a public key: the last 20 bytes of the keccak-256 digest of its
/// uncompressed encoding without the leading tag byte.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);

    Address::new(address)
}

/// Recovers the address that signed the attestation `(swap_id, operator)`.
pub fn recover_relay_signer(
    swap_id: &SwapId,
    operator: &Address,
    signature: &RelaySignature,
) -> Result<Address, RecoveryError> {
    let flag = signature.recovery_flag();
    let recovery_id = flag
        .checked_sub(RECOVERY_FLAG_OFFSET)
        .filter(|id| *id <= 1)
        .and_then(RecoveryId::from_byte)
        .ok_or(RecoveryError::InvalidRecoveryFlag(flag))?;

    let sig = Signature::from_slice(&signature.as_bytes()[..64])
        .map_err(|_| RecoveryError::MalformedSignature)?;

    let digest = relay_digest(swap_id, operator);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| RecoveryError::Unrecoverable)?;

    Ok(address_of(&key))
}

/// Returns `true` if `signature` is an attestation of `(swap_id, operator)` signed by `relayer`.
pub fn verify_relay_signature(
    swap_id: &SwapId,
    operator: &Address,
    relayer: &Address,
    signature: &RelaySignature,
) -> bool {
    recover_relay_signer(swap_id, operator, signature).is_ok_and(|signer| signer == *relayer)
}

/// Signs the attestation `(swap_id, operator)` with `key`.
pub fn sign_relay(
    key: &SigningKey,
    swap_id: &SwapId,
    operator: &Address,
) -> Result<RelaySignature, RecoveryError> {
    let digest = relay_digest(swap_id, operator);
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|_| RecoveryError::MalformedSignature)?;

    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&sig.to_bytes());
    bytes[64] = RECOVERY_FLAG_OFFSET + recovery_id.to_byte();

    Ok(RelaySignature(bytes))
}
