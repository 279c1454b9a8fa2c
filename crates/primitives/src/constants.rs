//! Constants that are integral to the protocol and must be identical on every network.

use crate::types::Address;

/// The sentinel address used to denote the native coin of a network as opposed to a token.
pub const NATIVE_ASSET: Address = Address::new([0xee; 20]);
