//! Scenario tests that drive a pair of protocol instances through whole swap lifecycles.

mod concurrency;
mod prop_tests;

use bolt_bridge_params::prelude::ProtocolParams;
use bolt_bridge_primitives::{Amount, BlockHeight, Route, SwapId};
use bolt_bridge_test_utils::prelude::{TestAccount, ETH, GWEI};

use crate::{
    attestation::{sign_relay, RelaySignature},
    bridge::RelayBridge,
    context::CallContext,
    output::CallOutput,
    swap::{SwapMessage, SwapRecord},
};

// ===== Test Constants =====

/// The network swaps originate from.
pub(super) const SRC_NETWORK: u32 = 0;
/// The network swaps are delivered on.
pub(super) const DST_NETWORK: u32 = 1;
/// The stake each relayer posts on each network.
pub(super) const RELAYER_STAKE: Amount = 3 * GWEI;
/// The block at which relayers stake.
pub(super) const STAKE_BLOCK: BlockHeight = 100;
/// The block at which swaps are opened and fulfilled.
pub(super) const SWAP_BLOCK: BlockHeight = 110;

/// Two protocol instances connected by the route `SRC_NETWORK -> DST_NETWORK`, a relayer staked
/// on both ends, and the accounts that interact with them.
pub(super) struct Fixture {
    pub(super) src: RelayBridge,
    pub(super) dst: RelayBridge,
    pub(super) route: Route,
    pub(super) relayer: TestAccount,
    pub(super) user: TestAccount,
    pub(super) operator: TestAccount,
    pub(super) other_operator: TestAccount,
}

impl Fixture {
    /// Creates the instances without any stake.
    pub(super) fn unstaked() -> Self {
        let params = ProtocolParams::default();

        Self {
            src: RelayBridge::new(SRC_NETWORK, params).unwrap(),
            dst: RelayBridge::new(DST_NETWORK, params).unwrap(),
            route: Route::new(SRC_NETWORK, DST_NETWORK).unwrap(),
            relayer: TestAccount::named("relayer"),
            user: TestAccount::named("user"),
            operator: TestAccount::named("operator"),
            other_operator: TestAccount::named("other-operator"),
        }
    }

    /// Creates the instances with [`RELAYER_STAKE`] staked by the relayer on both networks.
    pub(super) fn new() -> Self {
        let mut fixture = Self::unstaked();
        let ctx = fixture.relayer_ctx(STAKE_BLOCK).with_value(RELAYER_STAKE);

        for bridge in [&mut fixture.src, &mut fixture.dst] {
            bridge
                .stake(&ctx, &[fixture.route], &[RELAYER_STAKE], ETH)
                .unwrap();
        }

        fixture
    }

    pub(super) fn relayer_ctx(&self, block_height: BlockHeight) -> CallContext {
        CallContext::new(self.relayer.address(), block_height)
    }

    pub(super) fn user_ctx(&self, value: Amount) -> CallContext {
        CallContext::new(self.user.address(), SWAP_BLOCK).with_value(value)
    }

    pub(super) fn operator_ctx(&self, operator: &TestAccount, value: Amount) -> CallContext {
        CallContext::new(operator.address(), SWAP_BLOCK).with_value(value)
    }

    pub(super) fn message(&self) -> SwapMessage {
        SwapMessage::transfer(ETH, ETH)
    }

    /// Opens a swap of `amount_in` on the source network and returns its record.
    pub(super) fn open_swap(&mut self, amount_in: Amount) -> SwapRecord {
        let ctx = self.user_ctx(amount_in);
        let output = self
            .src
            .swap(
                &ctx,
                amount_in,
                self.relayer.address(),
                self.route,
                self.message(),
                self.message(),
            )
            .unwrap();

        let swap_id = output.swap_id().unwrap();
        self.src.swap_record(&swap_id).cloned().unwrap()
    }

    /// Fulfills `record` on the destination network as `operator`.
    pub(super) fn fulfill(&mut self, record: &SwapRecord, operator: &TestAccount) -> CallOutput {
        let ctx = self.operator_ctx(operator, record.cross_amount);
        let operator = operator.address();
        self.dst.fulfill(&ctx, record, operator).unwrap()
    }

    /// Signs the relayer's attestation that `operator` fulfilled `swap_id`.
    pub(super) fn attest(&self, swap_id: &SwapId, operator: &TestAccount) -> RelaySignature {
        sign_relay(self.relayer.signing_key(), swap_id, &operator.address()).unwrap()
    }

    pub(super) fn src_available(&self) -> Amount {
        let relayer = self.relayer.address();
        self.src.get_available_stake(relayer, self.route, ETH)
    }

    pub(super) fn dst_available(&self) -> Amount {
        let relayer = self.relayer.address();
        self.dst.get_available_stake(relayer, self.route, ETH)
    }
}
