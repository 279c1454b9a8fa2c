//! Errors for the protocol parameters.

use bolt_bridge_primitives::Amount;
use thiserror::Error;

/// Error while validating a set of [`ProtocolParams`](crate::protocol::ProtocolParams).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// A ratio that represents a share of some amount exceeds the whole.
    #[error("{name} must not exceed {max} basis points, got {value}")]
    RatioTooLarge {
        /// The name of the offending parameter.
        name: &'static str,
        /// The configured value.
        value: u32,
        /// The largest admissible value.
        max: u32,
    },

    /// The collateral multiplier is zero, which would let relayers back swaps with nothing.
    #[error("collateral_ratio must be positive")]
    ZeroCollateral,

    /// The swap bounds describe an empty range.
    #[error("min_swap_amount ({min}) exceeds max_swap_amount ({max})")]
    EmptySwapRange {
        /// The configured lower bound.
        min: Amount,
        /// The configured upper bound.
        max: Amount,
    },
}
