//! The economic parameters of the protocol along with the pure functions that derive fees,
//! collateral requirements and penalties from them.
//!
//! Every function here is deterministic so that both ends of a route compute the same amounts for
//! the same swap without communicating. All ratios are expressed in basis points over
//! [`RATIO_DENOMINATOR`].

use bolt_bridge_primitives::{Amount, BlockHeight};
use serde::{Deserialize, Serialize};

use crate::{
    default::{
        COLLATERAL_RATIO, FEE_RATIO, MAX_SWAP_AMOUNT, MIN_SWAP_AMOUNT, OPERATOR_REWARD_RATIO,
        SLASH_RATIO, SLASH_WINDOW, UNSTAKE_DELAY, WITHDRAW_DELAY,
    },
    errors::ParamsError,
};

/// The denominator for every ratio in [`ProtocolParams`].
pub const RATIO_DENOMINATOR: u32 = 10_000;

/// The immutable-per-deployment economic constants of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// The fee charged on the input amount of every swap.
    pub fee_ratio: u32,

    /// The share of the fee that is paid to the fulfilling operator on top of the reimbursement.
    ///
    /// The remainder of the fee stays with the relayer as its incentive.
    pub operator_reward_ratio: u32,

    /// The multiplier over the cross amount that a relayer must have available to back a swap.
    pub collateral_ratio: u32,

    /// The share of the collateral requirement that is taken from a relayer when it is slashed.
    pub slash_ratio: u32,

    /// The smallest admissible swap input (inclusive).
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub min_swap_amount: Amount,

    /// The largest admissible swap input (inclusive).
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub max_swap_amount: Amount,

    /// The number of blocks after a relayer's first stake on a route before it may unstake.
    pub unstake_delay: BlockHeight,

    /// The number of blocks that a pending unstake must mature before funds leave the ledger.
    pub withdraw_delay: BlockHeight,

    /// The number of blocks during which a fulfillment bond can be converted into a penalty.
    pub slash_window: BlockHeight,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            fee_ratio: FEE_RATIO,
            operator_reward_ratio: OPERATOR_REWARD_RATIO,
            collateral_ratio: COLLATERAL_RATIO,
            slash_ratio: SLASH_RATIO,
            min_swap_amount: MIN_SWAP_AMOUNT,
            max_swap_amount: MAX_SWAP_AMOUNT,
            unstake_delay: UNSTAKE_DELAY,
            withdraw_delay: WITHDRAW_DELAY,
            slash_window: SLASH_WINDOW,
        }
    }
}

/// Computes `floor(amount * ratio / RATIO_DENOMINATOR)` without overflowing the intermediate
/// product, saturating at [`Amount::MAX`].
pub fn apply_ratio(amount: Amount, ratio: u32) -> Amount {
    let denominator = Amount::from(RATIO_DENOMINATOR);
    let ratio = Amount::from(ratio);

    (amount / denominator)
        .saturating_mul(ratio)
        .saturating_add((amount % denominator) * ratio / denominator)
}

impl ProtocolParams {
    /// Checks that the parameters describe a coherent fee and collateral schedule.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in [
            ("fee_ratio", self.fee_ratio),
            ("operator_reward_ratio", self.operator_reward_ratio),
            ("slash_ratio", self.slash_ratio),
        ] {
            if value > RATIO_DENOMINATOR {
                return Err(ParamsError::RatioTooLarge {
                    name,
                    value,
                    max: RATIO_DENOMINATOR,
                });
            }
        }

        if self.collateral_ratio == 0 {
            return Err(ParamsError::ZeroCollateral);
        }

        if self.min_swap_amount > self.max_swap_amount {
            return Err(ParamsError::EmptySwapRange {
                min: self.min_swap_amount,
                max: self.max_swap_amount,
            });
        }

        Ok(())
    }

    /// Returns `true` if `amount_in` lies within the admissible swap range.
    pub const fn is_within_swap_bounds(&self, amount_in: Amount) -> bool {
        amount_in >= self.min_swap_amount && amount_in <= self.max_swap_amount
    }

    /// The fee charged on a swap of `amount_in`.
    pub fn fee(&self, amount_in: Amount) -> Amount {
        apply_ratio(amount_in, self.fee_ratio)
    }

    /// The amount owed to the requester on the destination network.
    ///
    /// `cross_amount(a) + fee(a) == a` holds for every `a`.
    pub fn cross_amount(&self, amount_in: Amount) -> Amount {
        amount_in - self.fee(amount_in)
    }

    /// The part of the fee paid to the fulfilling operator.
    pub fn operator_fee_share(&self, amount_in: Amount) -> Amount {
        apply_ratio(self.fee(amount_in), self.operator_reward_ratio)
    }

    /// The part of the fee kept by the relayer.
    pub fn relayer_fee_share(&self, amount_in: Amount) -> Amount {
        self.fee(amount_in) - self.operator_fee_share(amount_in)
    }

    /// The amount paid to the operator once the relayer's attestation is replayed on the source
    /// network: the advanced cross amount plus the operator's share of the fee.
    pub fn reward_amount(&self, amount_in: Amount) -> Amount {
        self.cross_amount(amount_in) + self.operator_fee_share(amount_in)
    }

    /// The collateral a relayer must have available to back a swap of `amount_in`.
    ///
    /// This is the collateral multiplier applied to the cross amount, but never less than the
    /// reward that the collateral secures. Non-decreasing in `amount_in`.
    pub fn lock_amount(&self, amount_in: Amount) -> Amount {
        apply_ratio(self.cross_amount(amount_in), self.collateral_ratio)
            .max(self.reward_amount(amount_in))
    }

    /// The penalty taken from a relayer whose attestation for a swap of `amount_in` names the
    /// wrong operator.
    ///
    /// The slash share of the collateral requirement, but never less than the reward the wronged
    /// fulfiller was owed. Never more than [`Self::lock_amount`].
    pub fn slash_penalty(&self, amount_in: Amount) -> Amount {
        apply_ratio(self.lock_amount(amount_in), self.slash_ratio)
            .max(self.reward_amount(amount_in))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const GWEI: Amount = 1_000_000_000;

    #[test]
    fn test_protocol_params_serde() {
        let params = ProtocolParams::default();
        let serialized = toml::to_string(&params).unwrap();

        let deserialized: ProtocolParams = toml::from_str(&serialized).unwrap();

        assert_eq!(params, deserialized);

        let params_toml = r#"
            fee_ratio = 1100
            operator_reward_ratio = 5000
            collateral_ratio = 20000
            slash_ratio = 5000
            min_swap_amount = 1000000
            max_swap_amount = "1000000000000000000000"
            unstake_delay = 1000
            withdraw_delay = 100
            slash_window = 1000
        "#;
        assert!(
            toml::from_str::<ProtocolParams>(params_toml).is_ok(),
            "must be able to deserialize ProtocolParams from a toml"
        );
    }

    #[test]
    fn default_params_are_valid() {
        assert_eq!(ProtocolParams::default().validate(), Ok(()));
    }

    #[test]
    fn oversized_ratio_is_rejected() {
        let params = ProtocolParams {
            fee_ratio: RATIO_DENOMINATOR + 1,
            ..Default::default()
        };

        assert_eq!(
            params.validate(),
            Err(ParamsError::RatioTooLarge {
                name: "fee_ratio",
                value: RATIO_DENOMINATOR + 1,
                max: RATIO_DENOMINATOR,
            })
        );
    }

    #[test]
    fn zero_collateral_and_empty_range_are_rejected() {
        let zero_collateral = ProtocolParams {
            collateral_ratio: 0,
            ..Default::default()
        };
        assert_eq!(zero_collateral.validate(), Err(ParamsError::ZeroCollateral));

        let empty_range = ProtocolParams {
            min_swap_amount: 10,
            max_swap_amount: 9,
            ..Default::default()
        };
        assert_eq!(
            empty_range.validate(),
            Err(ParamsError::EmptySwapRange { min: 10, max: 9 })
        );
    }

    #[test]
    fn default_schedule_for_one_gwei() {
        let params = ProtocolParams::default();

        // 11% fee leaves 0.89 gwei for the requester.
        assert_eq!(params.fee(GWEI), 110_000_000);
        assert_eq!(params.cross_amount(GWEI), 890_000_000);

        // Half of the fee goes to the operator.
        assert_eq!(params.operator_fee_share(GWEI), 55_000_000);
        assert_eq!(params.relayer_fee_share(GWEI), 55_000_000);
        assert_eq!(params.reward_amount(GWEI), 945_000_000);

        // 2x the cross amount must be available, which fits in a 3 gwei stake.
        assert_eq!(params.lock_amount(GWEI), 1_780_000_000);
        assert!(params.lock_amount(GWEI) <= 3 * GWEI);

        // half of the collateral falls short of the reward, so the reward is the penalty
        assert_eq!(params.slash_penalty(GWEI), 945_000_000);
    }

    #[test]
    fn slash_penalty_follows_ratio_above_reward() {
        let params = ProtocolParams {
            collateral_ratio: 40_000,
            ..Default::default()
        };

        // 4x the cross amount, half of which exceeds the reward
        assert_eq!(params.lock_amount(GWEI), 3_560_000_000);
        assert_eq!(params.slash_penalty(GWEI), 1_780_000_000);
    }

    #[test]
    fn lock_amount_never_below_reward() {
        let params = ProtocolParams {
            collateral_ratio: 1,
            ..Default::default()
        };

        assert_eq!(params.lock_amount(GWEI), params.reward_amount(GWEI));
    }

    #[test]
    fn apply_ratio_does_not_overflow() {
        assert_eq!(apply_ratio(Amount::MAX, RATIO_DENOMINATOR), Amount::MAX);
        assert_eq!(apply_ratio(Amount::MAX, 2 * RATIO_DENOMINATOR), Amount::MAX);
        assert_eq!(apply_ratio(Amount::MAX, 0), 0);
    }

    proptest! {
        #[test]
        fn fee_is_conserved(amount in any::<Amount>(), fee_ratio in 0..=RATIO_DENOMINATOR) {
            let params = ProtocolParams { fee_ratio, ..Default::default() };

            prop_assert_eq!(params.cross_amount(amount) + params.fee(amount), amount);
            prop_assert_eq!(
                params.operator_fee_share(amount) + params.relayer_fee_share(amount),
                params.fee(amount)
            );
        }

        #[test]
        fn lock_amount_is_monotonic(
            amount in 0..Amount::MAX / 4,
            step in 0..1_000_000u128,
            fee_ratio in 0..=RATIO_DENOMINATOR,
            collateral_ratio in 1..100_000u32,
        ) {
            let params = ProtocolParams { fee_ratio, collateral_ratio, ..Default::default() };

            prop_assert!(params.lock_amount(amount) <= params.lock_amount(amount + step));
            prop_assert_eq!(params.lock_amount(amount), params.lock_amount(amount));
        }

        #[test]
        fn reward_never_exceeds_input(amount in any::<Amount>()) {
            let params = ProtocolParams::default();

            prop_assert!(params.reward_amount(amount) <= amount);
            prop_assert!(params.slash_penalty(amount) <= params.lock_amount(amount));
            prop_assert!(params.slash_penalty(amount) >= params.reward_amount(amount));
        }
    }
}
