//! The protocol instance deployed on a single network.

use bolt_bridge_params::prelude::{ParamsError, ProtocolParams};
use bolt_bridge_primitives::{Address, Amount, NetworkId, Route, RouteSide};
use tracing::{debug, info};

use crate::{
    call::Call,
    context::CallContext,
    errors::{ProtocolError, ProtocolResult},
    lock::LockRegistry,
    output::CallOutput,
    stake::{StakeKey, StakeLedger},
    swap::SwapBook,
};

/// The protocol instance of one network.
///
/// Instances on different networks share nothing but their [`ProtocolParams`]; everything that
/// crosses from one network to another is carried by a caller (swap records, attestations).
#[derive(Debug, Clone)]
pub struct RelayBridge {
    network: NetworkId,
    params: ProtocolParams,
    pub(crate) ledger: StakeLedger,
    pub(crate) locks: LockRegistry,
    pub(crate) swaps: SwapBook,
}

impl RelayBridge {
    /// Creates the instance for `network`, rejecting incoherent parameters.
    pub fn new(network: impl Into<NetworkId>, params: ProtocolParams) -> Result<Self, ParamsError> {
        params.validate()?;

        let network = network.into();
        info!(%network, "initialized relay bridge");

        Ok(Self {
            network,
            params,
            ledger: StakeLedger::default(),
            locks: LockRegistry::default(),
            swaps: SwapBook::default(),
        })
    }

    /// The network this instance runs on.
    pub const fn network(&self) -> NetworkId {
        self.network
    }

    /// The protocol parameters.
    pub const fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// The stake ledger.
    pub const fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    /// The lock registry.
    pub const fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// The swap records and fulfillments.
    pub const fn swaps(&self) -> &SwapBook {
        &self.swaps
    }

    /// The stake of `relayer` on `route` in `asset` that can back new obligations.
    pub fn get_available_stake(&self, relayer: Address, route: Route, asset: Address) -> Amount {
        let key = StakeKey::new(relayer, route, asset);
        self.ledger.available(&key)
    }

    /// The collateral required to back a swap of `amount_in`.
    pub fn get_lock_amount(&self, amount_in: Amount) -> Amount {
        self.params.lock_amount(amount_in)
    }

    /// Executes `call` in `ctx`.
    ///
    /// Either the whole call takes effect and its output is returned, or nothing changes.
    pub fn execute(&mut self, ctx: &CallContext, call: Call) -> ProtocolResult<CallOutput> {
        debug!(
            network = %self.network,
            caller = %ctx.caller,
            block = ctx.block_height,
            call = call.name(),
            "executing call"
        );

        match call {
            Call::Stake {
                routes,
                amounts,
                asset,
            } => self.stake(ctx, &routes, &amounts, asset),
            Call::Unstake {
                route,
                amount,
                asset,
            } => self.unstake(ctx, route, amount, asset),
            Call::Unlock { nonce } => self.unlock(ctx, nonce),
            Call::Swap {
                amount_in,
                relayer,
                route,
                src_message,
                dst_message,
            } => self.swap(ctx, amount_in, relayer, route, src_message, dst_message),
            Call::Fulfill { record, operator } => self.fulfill(ctx, &record, operator),
            Call::Relay {
                swap_id,
                operator,
                relayer,
                signature,
            } => self.relay(ctx, swap_id, operator, relayer, &signature),
            Call::RelayReturn {
                swap_id,
                operator,
                relayer,
                signature,
            } => self.relay_return(ctx, swap_id, operator, relayer, &signature),
            Call::Slash {
                rule_id,
                record,
                alleged_operator,
                relayer,
                signature,
            } => self.slash(ctx, rule_id, &record, alleged_operator, relayer, &signature),
        }
    }

    /// Checks that `route` touches this network.
    pub(crate) fn require_route(&self, route: Route) -> ProtocolResult<RouteSide> {
        route
            .side_of(self.network)
            .ok_or(ProtocolError::RouteInvalid {
                route,
                network: self.network,
            })
    }

    /// Checks that this network is on `side` of `route`.
    pub(crate) fn expect_side(&self, route: Route, side: RouteSide) -> ProtocolResult<()> {
        if self.require_route(route)? == side {
            Ok(())
        } else {
            Err(ProtocolError::RouteInvalid {
                route,
                network: self.network,
            })
        }
    }
}
