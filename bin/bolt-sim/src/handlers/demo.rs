//! Simulates two networks running the relay bridge and walks a swap through its lifecycle.
//!
//! Each simulated network keeps plain account balances next to its protocol instance. Value
//! attached to a call is taken from the caller's balance, and the transfer duties of the output
//! are credited to their receivers.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use bolt_bridge_params::prelude::ProtocolParams;
use bolt_bridge_primitives::{constants::NATIVE_ASSET, Address, Amount, BlockHeight, Route};
use bolt_bridge_protocol::{
    attestation::sign_relay,
    settlement::SlashRule,
    swap::{SwapMessage, SwapRecord},
    Call, CallContext, CallOutput, Duty, RelayBridge, SharedBridge,
};
use bolt_bridge_test_utils::accounts::TestAccount;
use tracing::{info, warn};

use crate::{cli::DemoArgs, params::load_params};

/// The funds every simulated account starts with.
const INITIAL_BALANCE: Amount = 10_000_000_000;

/// The stake the relayer posts on each network.
const RELAYER_STAKE: Amount = 3_000_000_000;

/// A simulated network: a protocol instance plus native balances.
struct SimNetwork {
    name: &'static str,
    bridge: SharedBridge,
    balances: BTreeMap<Address, Amount>,
    block_height: BlockHeight,
}

impl std::fmt::Debug for SimNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimNetwork")
            .field("name", &self.name)
            .field("block_height", &self.block_height)
            .finish_non_exhaustive()
    }
}

impl SimNetwork {
    fn new(
        name: &'static str,
        network: u32,
        params: ProtocolParams,
        accounts: &[&TestAccount],
    ) -> Result<Self> {
        let bridge = RelayBridge::new(network, params)?;

        Ok(Self {
            name,
            bridge: SharedBridge::new(bridge),
            balances: accounts
                .iter()
                .map(|account| (account.address(), INITIAL_BALANCE))
                .collect(),
            block_height: 100,
        })
    }

    fn advance(&mut self, blocks: BlockHeight) {
        self.block_height += blocks;
    }

    /// Executes `call` from `caller` with `value` attached and applies the resulting transfers.
    fn submit(&mut self, caller: &TestAccount, value: Amount, call: Call) -> Result<CallOutput> {
        let balance = self.balances.entry(caller.address()).or_default();
        let remaining = balance.checked_sub(value).ok_or_else(|| {
            anyhow!(
                "{} cannot attach {value} on {}, has {balance}",
                caller.name(),
                self.name
            )
        })?;

        let ctx = CallContext::new(caller.address(), self.block_height).with_value(value);
        let call_name = call.name();
        let output = self
            .bridge
            .execute(&ctx, call)
            .with_context(|| format!("{call_name} by {} on {}", caller.name(), self.name))?;

        self.balances.insert(caller.address(), remaining);
        for duty in &output.duties {
            match duty {
                Duty::Transfer { to, amount, .. } => {
                    *self.balances.entry(*to).or_default() += amount;
                }
                Duty::ExecuteCall { target, .. } => {
                    info!(network = self.name, %target, "skipping post-delivery call");
                }
            }
        }

        for event in &output.events {
            info!(network = self.name, block = self.block_height, %event, "event");
        }

        Ok(output)
    }

    fn balance(&self, account: &TestAccount) -> Amount {
        self.balances
            .get(&account.address())
            .copied()
            .unwrap_or_default()
    }

    fn available(&self, relayer: &TestAccount, route: Route) -> Amount {
        self.bridge
            .read(|bridge| bridge.get_available_stake(relayer.address(), route, NATIVE_ASSET))
    }
}

/// Handles the demo command.
pub(crate) fn handle_demo(args: DemoArgs) -> Result<()> {
    let params = load_params(args.params.as_deref())?;

    let relayer = TestAccount::named("relayer");
    let user = TestAccount::named("user");
    let operator = TestAccount::named("operator");
    let impostor = TestAccount::named("impostor");
    let accounts = [&relayer, &user, &operator, &impostor];

    let mut src = SimNetwork::new("source", 0, params, &accounts)?;
    let mut dst = SimNetwork::new("destination", 1, params, &accounts)?;
    let route = Route::new(0u32, 1u32)?;

    info!(%route, relayer = %relayer.address(), operator = %operator.address(), "starting demo");

    // relayer collateralizes the route on both ends
    for network in [&mut src, &mut dst] {
        network.submit(
            &relayer,
            RELAYER_STAKE,
            Call::Stake {
                routes: vec![route],
                amounts: vec![RELAYER_STAKE],
                asset: NATIVE_ASSET,
            },
        )?;
        network.advance(10);
    }

    // user opens the swap on the source network
    let message = SwapMessage::transfer(NATIVE_ASSET, NATIVE_ASSET);
    let output = src.submit(
        &user,
        args.amount,
        Call::Swap {
            amount_in: args.amount,
            relayer: relayer.address(),
            route,
            src_message: message.clone(),
            dst_message: message,
        },
    )?;
    let swap_id = output
        .swap_id()
        .ok_or_else(|| anyhow!("swap emitted no identifier"))?;
    let record: SwapRecord = src
        .bridge
        .read(|bridge| bridge.swap_record(&swap_id).cloned())
        .ok_or_else(|| anyhow!("swap {swap_id} not recorded"))?;

    info!(record = %serde_json::to_string(&record)?, "swap record handed to operators");

    // operator delivers on the destination network
    dst.submit(
        &operator,
        record.cross_amount,
        Call::Fulfill {
            record: record.clone(),
            operator: operator.address(),
        },
    )?;
    dst.advance(1);
    src.advance(1);

    // relayer attests who fulfilled the swap; a colluding relayer settles the destination
    // honestly and hands the impostor a second attestation to collect the reward with
    let honest = sign_relay(relayer.signing_key(), &swap_id, &operator.address())?;
    let named = if args.mismatch { &impostor } else { &operator };
    let signature = sign_relay(relayer.signing_key(), &swap_id, &named.address())?;
    if args.mismatch {
        warn!(%swap_id, named = %named.address(), "relayer attests the wrong operator");
    }

    dst.submit(
        &relayer,
        0,
        Call::Relay {
            swap_id,
            operator: operator.address(),
            relayer: relayer.address(),
            signature: honest,
        },
    )?;
    src.submit(
        named,
        0,
        Call::RelayReturn {
            swap_id,
            operator: named.address(),
            relayer: relayer.address(),
            signature,
        },
    )?;

    if args.mismatch {
        // the true fulfiller proves the mismatch where it delivered
        dst.submit(
            &operator,
            0,
            Call::Slash {
                rule_id: SlashRule::OperatorMismatch.id(),
                record: record.clone(),
                alleged_operator: named.address(),
                relayer: relayer.address(),
                signature,
            },
        )?;
    }

    for network in [&src, &dst] {
        for account in accounts {
            info!(
                network = network.name,
                account = account.name(),
                balance = %network.balance(account),
                "final balance"
            );
        }
        info!(
            network = network.name,
            available = %network.available(&relayer, route),
            "relayer available stake"
        );
    }

    let operator_delta = (src.balance(&operator) + dst.balance(&operator)) as i128
        - 2 * INITIAL_BALANCE as i128;
    info!(%operator_delta, "operator net result");

    let fee_share = params.operator_fee_share(args.amount) as i128;
    if operator_delta < fee_share || (!args.mismatch && operator_delta != fee_share) {
        bail!("operator was not paid its fee share");
    }

    Ok(())
}
