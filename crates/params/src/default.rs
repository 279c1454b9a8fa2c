//! Default values for the protocol parameters.

use bolt_bridge_primitives::{Amount, BlockHeight};

/// Default fee charged on every swap, in basis points (11%).
pub(crate) const FEE_RATIO: u32 = 1_100;

/// Default share of the fee that goes to the fulfilling operator, in basis points.
pub(crate) const OPERATOR_REWARD_RATIO: u32 = 5_000;

/// Default collateral multiplier over the cross amount, in basis points (2x).
pub(crate) const COLLATERAL_RATIO: u32 = 20_000;

/// Default penalty as a share of the collateral requirement, in basis points.
pub(crate) const SLASH_RATIO: u32 = 5_000;

/// Default minimum swap size (0.001 gwei-denominated units).
pub(crate) const MIN_SWAP_AMOUNT: Amount = 1_000_000;

/// Default maximum swap size (one billion whole coins with 18 decimals).
pub(crate) const MAX_SWAP_AMOUNT: Amount = 1_000_000_000_000_000_000_000_000_000;

/// Default number of blocks after a relayer's first stake on a route before it may unstake.
pub(crate) const UNSTAKE_DELAY: BlockHeight = 1_000;

/// Default number of blocks a `PendingUnstake` lock must mature before the funds can leave.
pub(crate) const WITHDRAW_DELAY: BlockHeight = 100;

/// Default number of blocks during which a destination-side fulfillment bond can be slashed.
pub(crate) const SLASH_WINDOW: BlockHeight = 1_000;
