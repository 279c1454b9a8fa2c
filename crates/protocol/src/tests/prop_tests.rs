//! Property-based tests over random call sequences.

use std::collections::BTreeMap;

use bolt_bridge_primitives::Amount;
use bolt_bridge_test_utils::prelude::{account_pool, call_data, swap_amount, ETH};
use proptest::prelude::*;

use super::*;
use crate::{output::Duty, stake::StakeKey};

/// The number of operators competing for swaps.
const OPERATORS: usize = 3;

/// A step in a random scenario.
#[derive(Debug, Clone)]
enum Step {
    Stake(Amount),
    Swap { amount: Amount, call_data: Vec<u8> },
    Fulfill { swap: usize, operator: TestAccount },
    Attest { swap: usize, named: TestAccount },
    Slash { swap: usize, alleged: TestAccount },
    Unstake { amount: Amount, on_dst: bool },
    Unlock { nonce: u64, late: bool },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1..4 * GWEI).prop_map(Step::Stake),
        (swap_amount(), call_data())
            .prop_map(|(amount, call_data)| Step::Swap { amount, call_data }),
        (0..8usize, account_pool(OPERATORS))
            .prop_map(|(swap, operator)| Step::Fulfill { swap, operator }),
        (0..8usize, account_pool(OPERATORS))
            .prop_map(|(swap, named)| Step::Attest { swap, named }),
        (0..8usize, account_pool(OPERATORS))
            .prop_map(|(swap, alleged)| Step::Slash { swap, alleged }),
        (1..4 * GWEI, any::<bool>())
            .prop_map(|(amount, on_dst)| Step::Unstake { amount, on_dst }),
        (1..16u64, any::<bool>()).prop_map(|(nonce, late)| Step::Unlock { nonce, late }),
    ]
}

/// Tracks value that entered and left the custody of one instance.
#[derive(Debug, Default)]
struct Flows {
    inflow: Amount,
    outflow: Amount,
}

impl Flows {
    fn record_outflows(&mut self, output: &CallOutput) {
        for duty in &output.duties {
            if let Duty::Transfer { amount, .. } = duty {
                self.outflow += amount;
            }
        }
    }
}

/// Checks the ledger invariants of `bridge`.
fn check_ledger(bridge: &RelayBridge) -> Result<(), TestCaseError> {
    let mut locked_by_key: BTreeMap<StakeKey, Amount> = BTreeMap::new();
    for (_, lock) in bridge.locks().active() {
        *locked_by_key.entry(lock.stake_key()).or_default() += lock.amount;
    }

    for (key, account) in bridge.ledger().iter() {
        prop_assert!(account.locked <= account.staked);
        prop_assert_eq!(account.available(), account.staked - account.locked);
        prop_assert_eq!(
            locked_by_key.get(key).copied().unwrap_or_default(),
            account.locked
        );
    }

    Ok(())
}

/// Balances, next lock nonce and record counts of an instance.
type Snapshot = (Vec<(StakeKey, Amount, Amount)>, u64, usize, usize);

fn snapshot(bridge: &RelayBridge) -> Snapshot {
    (
        bridge
            .ledger()
            .iter()
            .map(|(key, account)| (*key, account.staked, account.locked))
            .collect(),
        bridge.locks().next_nonce(),
        bridge.swaps().num_records(),
        bridge.swaps().num_fulfillments(),
    )
}

fn run(steps: Vec<Step>) -> Result<(), TestCaseError> {
    let mut fixture = Fixture::new();
    let mut records: Vec<SwapRecord> = Vec::new();
    let mut src_flows = Flows {
        inflow: RELAYER_STAKE,
        ..Default::default()
    };
    let mut dst_flows = Flows {
        inflow: RELAYER_STAKE,
        ..Default::default()
    };
    let unstake_block = STAKE_BLOCK + fixture.src.params().unstake_delay;
    let late_block = unstake_block + fixture.src.params().withdraw_delay
        + fixture.src.params().slash_window;

    for step in steps {
        let before = (snapshot(&fixture.src), snapshot(&fixture.dst));

        let result = match step {
            Step::Stake(amount) => {
                let ctx = fixture.relayer_ctx(SWAP_BLOCK).with_value(amount);
                let route = fixture.route;
                fixture.src.stake(&ctx, &[route], &[amount], ETH).inspect(|_| {
                    src_flows.inflow += amount;
                })
            }
            Step::Swap { amount, call_data } => {
                let ctx = fixture.user_ctx(amount);
                let relayer = fixture.relayer.address();
                let (route, message) = (fixture.route, fixture.message());
                let dst_message = SwapMessage {
                    call_data,
                    ..message.clone()
                };
                fixture
                    .src
                    .swap(&ctx, amount, relayer, route, message, dst_message)
                    .inspect(|output| {
                        src_flows.inflow += amount;
                        if let Some(record) =
                            output.swap_id().and_then(|id| fixture.src.swap_record(&id))
                        {
                            records.push(record.clone());
                        }
                    })
            }
            Step::Fulfill { swap, operator } => {
                let Some(record) = records.get(swap).cloned() else {
                    continue;
                };
                let ctx = fixture.operator_ctx(&operator, record.cross_amount);
                // the delivery is paid out of the attached value, not out of custody
                fixture.dst.fulfill(&ctx, &record, operator.address())
            }
            Step::Attest { swap, named } => {
                let Some(record) = records.get(swap).cloned() else {
                    continue;
                };
                let swap_id = record.swap_id();
                let signature = fixture.attest(&swap_id, &named);
                let ctx = fixture.relayer_ctx(SWAP_BLOCK);
                let relayer = fixture.relayer.address();

                let relayed = fixture
                    .dst
                    .relay(&ctx, swap_id, named.address(), relayer, &signature);
                let returned = fixture
                    .src
                    .relay_return(&ctx, swap_id, named.address(), relayer, &signature);
                if let Ok(output) = &returned {
                    src_flows.record_outflows(output);
                }

                relayed.or(returned)
            }
            Step::Slash { swap, alleged } => {
                let Some(record) = records.get(swap).cloned() else {
                    continue;
                };
                let swap_id = record.swap_id();
                let signature = fixture.attest(&swap_id, &alleged);
                let ctx = fixture.relayer_ctx(SWAP_BLOCK);
                let relayer = fixture.relayer.address();
                let fulfiller = fixture.dst.fulfillment(&swap_id).map(|f| f.operator);
                let penalty = fixture.dst.params().slash_penalty(record.amount_in);

                let result = fixture
                    .dst
                    .slash(&ctx, 2, &record, alleged.address(), relayer, &signature)
                    .inspect(|output| dst_flows.record_outflows(output));

                // a proven mismatch pays the fulfiller in full unless it drains the relayer
                if let (Ok(output), Some(fulfiller)) = (&result, fulfiller) {
                    prop_assert_ne!(fulfiller, alleged.address());
                    let paid = output.transferred_to(ETH, fulfiller);
                    prop_assert!(paid <= penalty);
                    prop_assert!(paid == penalty || fixture.dst_available() == 0);
                }
                if fulfiller.is_some_and(|f| f == alleged.address()) {
                    prop_assert!(result.is_err());
                }

                result
            }
            Step::Unstake { amount, on_dst } => {
                let ctx = fixture.relayer_ctx(unstake_block);
                let route = fixture.route;
                let bridge = if on_dst {
                    &mut fixture.dst
                } else {
                    &mut fixture.src
                };
                bridge.unstake(&ctx, route, amount, ETH)
            }
            Step::Unlock { nonce, late } => {
                let block = if late { late_block } else { SWAP_BLOCK };
                let ctx = fixture.relayer_ctx(block);
                let src = fixture
                    .src
                    .unlock(&ctx, nonce)
                    .inspect(|output| src_flows.record_outflows(output));
                let dst = fixture
                    .dst
                    .unlock(&ctx, nonce)
                    .inspect(|output| dst_flows.record_outflows(output));

                src.or(dst)
            }
        };

        // steps touching both instances fail only if both calls failed
        if result.is_err() {
            prop_assert_eq!(&before.0, &snapshot(&fixture.src));
            prop_assert_eq!(&before.1, &snapshot(&fixture.dst));
        }

        check_ledger(&fixture.src)?;
        check_ledger(&fixture.dst)?;

        prop_assert_eq!(
            fixture.src.ledger().total_staked(),
            src_flows.inflow - src_flows.outflow
        );
        prop_assert_eq!(
            fixture.dst.ledger().total_staked(),
            dst_flows.inflow - dst_flows.outflow
        );
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_invariants_hold(steps in prop::collection::vec(arb_step(), 1..24)) {
        run(steps)?;
    }

    #[test]
    fn full_cycle_pays_exact_shares(amount in swap_amount()) {
        let mut fixture = Fixture::new();
        let params = *fixture.src.params();
        prop_assume!(params.lock_amount(amount) <= RELAYER_STAKE);

        let record = fixture.open_swap(amount);
        let operator = fixture.operator.clone();
        fixture.fulfill(&record, &operator);

        let swap_id = record.swap_id();
        let signature = fixture.attest(&swap_id, &operator);
        let ctx = fixture.relayer_ctx(SWAP_BLOCK);
        let relayer = fixture.relayer.address();

        fixture.dst.relay(&ctx, swap_id, operator.address(), relayer, &signature).unwrap();
        let output = fixture
            .src
            .relay_return(&ctx, swap_id, operator.address(), relayer, &signature)
            .unwrap();

        prop_assert_eq!(
            output.transferred_to(ETH, operator.address()),
            params.reward_amount(amount)
        );
        prop_assert_eq!(fixture.src_available(), RELAYER_STAKE + params.relayer_fee_share(amount));
        prop_assert_eq!(fixture.dst_available(), RELAYER_STAKE);
    }
}
