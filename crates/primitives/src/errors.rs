//! Errors that can occur while parsing or constructing primitive types.

use thiserror::Error;

use crate::route::NetworkId;

/// Errors related to the primitive types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// The input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded input does not have the expected length.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// The number of bytes that were expected.
        expected: usize,
        /// The number of bytes that were found.
        actual: usize,
    },

    /// A route must connect two distinct networks.
    #[error("route endpoints must differ, got {0} on both ends")]
    DegenerateRoute(NetworkId),
}
