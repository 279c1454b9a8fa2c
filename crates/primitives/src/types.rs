//! Fixed-size byte identifiers and scalar aliases used throughout the bridge.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PrimitiveError;

/// An amount of some asset in its smallest unit.
pub type Amount = u128;

/// The height of a block on any of the networks connected by the bridge.
pub type BlockHeight = u64;

/// The nonce that uniquely identifies a lock within a single protocol instance.
pub type LockNonce = u64;

/// The per-relayer counter that distinguishes otherwise identical swaps.
pub type SwapNonce = u64;

/// Decodes an optionally `0x`-prefixed hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], PrimitiveError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))?;

    bytes
        .as_slice()
        .try_into()
        .map_err(|_| PrimitiveError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        })
}

/// Implements hex display, parsing and string-based serde for a fixed-size byte newtype.
macro_rules! impl_hex_newtype {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Creates a new instance from raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns the underlying bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Returns `true` if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = PrimitiveError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                value
                    .try_into()
                    .map(Self)
                    .map_err(|_| PrimitiveError::InvalidLength {
                        expected: $len,
                        actual: value.len(),
                    })
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }

        #[cfg(feature = "arbitrary")]
        impl proptest::arbitrary::Arbitrary for $name {
            type Parameters = ();
            type Strategy = proptest::strategy::BoxedStrategy<Self>;

            fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
                use proptest::strategy::Strategy;

                proptest::prelude::any::<[u8; $len]>()
                    .prop_map(Self::new)
                    .boxed()
            }
        }
    };
}

/// A 20-byte account identifier on any of the networks connected by the bridge.
///
/// Relayers, operators, requesters and token contracts are all identified by an [`Address`]. The
/// address of a key is the last 20 bytes of the keccak-256 digest of its uncompressed public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl_hex_newtype!(Address, 20);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0; 20]);
}

/// A 32-byte keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash32([u8; 32]);

impl_hex_newtype!(Hash32, 32);

impl Hash32 {
    /// The all-zero digest, used where a lock is not linked to any swap.
    pub const ZERO: Self = Self([0; 32]);
}

/// The identifier of a swap, derived deterministically from the swap's contents.
pub type SwapId = Hash32;
