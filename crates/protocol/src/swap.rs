//! The swap coordinator: swap records and their identifiers, the source-side `swap` call and the
//! destination-side `fulfill` call.

use std::collections::BTreeMap;

use bolt_bridge_primitives::{
    hash::keccak256_concat, Address, Amount, BlockHeight, Hash32, LockNonce, Route, RouteSide,
    SwapId, SwapNonce,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    bridge::RelayBridge,
    context::CallContext,
    errors::{ProtocolError, ProtocolResult},
    events::ProtocolEvent,
    lock::{Lock, LockStatus, LockType},
    output::{CallOutput, Duty},
    stake::StakeKey,
};

/// What a swap does on one side of its route.
///
/// On the source network only `token_in` matters; on the destination network `token_out` is the
/// delivered asset and, if `call_data` is non-empty, `call_address` is invoked after delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SwapMessage {
    /// The asset taken from the requester.
    pub token_in: Address,
    /// The asset delivered to the requester.
    pub token_out: Address,
    /// The payload of the post-delivery call, empty for none.
    #[serde(with = "hex::serde", default)]
    pub call_data: Vec<u8>,
    /// The target of the post-delivery call.
    pub call_address: Address,
}

impl SwapMessage {
    /// A message that moves `token_in` into `token_out` without a post-delivery call.
    pub const fn transfer(token_in: Address, token_out: Address) -> Self {
        Self {
            token_in,
            token_out,
            call_data: Vec::new(),
            call_address: Address::ZERO,
        }
    }

    fn encoded_len(&self) -> [u8; 8] {
        (self.call_data.len() as u64).to_be_bytes()
    }
}

/// Everything needed to recognise a swap on either side of its route.
///
/// The destination network never sees the source network's state; it recomputes the swap
/// identifier from the record an operator presents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// The input escrowed on the source network.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub amount_in: Amount,
    /// The amount owed to the requester on the destination network.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub cross_amount: Amount,
    /// The relayer backing the swap.
    pub relayer: Address,
    /// The route of the swap.
    pub route: Route,
    /// The requester.
    pub requester: Address,
    /// The source-side message.
    pub src_message: SwapMessage,
    /// The destination-side message.
    pub dst_message: SwapMessage,
    /// The relayer's swap counter at creation.
    pub swap_nonce: SwapNonce,
    /// The nonce of the reward lock on the source network.
    pub nonce: LockNonce,
}

impl SwapRecord {
    /// Derives the swap identifier.
    ///
    /// The identifier commits to every field of the record in a fixed big-endian packed layout.
    pub fn swap_id(&self) -> SwapId {
        let src = self.route.src().0.to_be_bytes();
        let dst = self.route.dst().0.to_be_bytes();
        let swap_nonce = self.swap_nonce.to_be_bytes();
        let amount_in = self.amount_in.to_be_bytes();
        let cross_amount = self.cross_amount.to_be_bytes();
        let nonce = self.nonce.to_be_bytes();
        let src_len = self.src_message.encoded_len();
        let dst_len = self.dst_message.encoded_len();

        Hash32::new(keccak256_concat(&[
            self.requester.as_bytes(),
            self.relayer.as_bytes(),
            &src,
            &dst,
            &swap_nonce,
            &amount_in,
            &cross_amount,
            &nonce,
            self.src_message.token_in.as_bytes(),
            self.src_message.token_out.as_bytes(),
            self.src_message.call_address.as_bytes(),
            &src_len,
            &self.src_message.call_data,
            self.dst_message.token_in.as_bytes(),
            self.dst_message.token_out.as_bytes(),
            self.dst_message.call_address.as_bytes(),
            &dst_len,
            &self.dst_message.call_data,
        ]))
    }
}

/// What became of a swap on the destination network after it was fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    /// Delivered, no attestation accepted yet.
    Fulfilled,
    /// An attestation naming `operator` was accepted.
    Relayed {
        /// The operator named by the attestation.
        operator: Address,
    },
    /// The relayer was penalised for a false attestation.
    Slashed,
}

/// The destination-side record of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    /// The operator that delivered the cross amount.
    pub operator: Address,
    /// The relayer backing the swap.
    pub relayer: Address,
    /// The route of the swap.
    pub route: Route,
    /// The requester that received the delivery.
    pub requester: Address,
    /// The delivered asset.
    pub asset: Address,
    /// The delivered amount.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub cross_amount: Amount,
    /// The nonce of the relayer's bond for this delivery.
    pub bond_nonce: LockNonce,
    /// The block of the delivery.
    pub fulfilled_at: BlockHeight,
    /// What happened since.
    pub status: DestinationStatus,
}

/// The lifecycle of a swap as observed by one protocol instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapState {
    /// Source side: opened, reward still locked.
    Created,
    /// Source side: reward paid to the attested operator.
    RewardReleased,
    /// Destination side: delivered, awaiting an attestation.
    Fulfilled,
    /// Destination side: an attestation was accepted.
    Relayed,
    /// Destination side: the relayer was penalised.
    Slashed,
}

/// Swap records created on this network and fulfillments observed on it.
#[derive(Debug, Clone, Default)]
pub struct SwapBook {
    pub(crate) records: BTreeMap<SwapId, SwapRecord>,
    pub(crate) fulfillments: BTreeMap<SwapId, Fulfillment>,
    swap_nonces: BTreeMap<Address, SwapNonce>,
}

impl SwapBook {
    /// The swap counter that the next swap backed by `relayer` will use.
    pub fn next_swap_nonce(&self, relayer: &Address) -> SwapNonce {
        self.swap_nonces.get(relayer).copied().unwrap_or_default()
    }

    /// The number of swaps opened on this network.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// The number of fulfillments observed on this network.
    pub fn num_fulfillments(&self) -> usize {
        self.fulfillments.len()
    }

    fn bump_swap_nonce(&mut self, relayer: Address) {
        *self.swap_nonces.entry(relayer).or_default() += 1;
    }
}

impl RelayBridge {
    /// Opens a swap of `amount_in` backed by `relayer` on the source network.
    ///
    /// The attached value is credited to the relayer's stake on `(relayer, route,
    /// src_message.token_in)` and [`ProtocolParams::lock_amount`] of it is immediately locked
    /// as the operator's future reward.
    ///
    /// [`ProtocolParams::lock_amount`]: bolt_bridge_params::prelude::ProtocolParams::lock_amount
    pub fn swap(
        &mut self,
        ctx: &CallContext,
        amount_in: Amount,
        relayer: Address,
        route: Route,
        src_message: SwapMessage,
        dst_message: SwapMessage,
    ) -> ProtocolResult<CallOutput> {
        self.expect_side(route, RouteSide::Source)?;

        let params = *self.params();
        if !params.is_within_swap_bounds(amount_in) {
            return Err(ProtocolError::AmountOutOfBounds {
                amount: amount_in,
                min: params.min_swap_amount,
                max: params.max_swap_amount,
            });
        }
        ctx.expect_value(amount_in)?;

        let key = StakeKey::new(relayer, route, src_message.token_in);
        let lock_amount = params.lock_amount(amount_in);
        let available = self.ledger.available(&key);
        if available < lock_amount {
            return Err(ProtocolError::InsufficientAvailable {
                requested: lock_amount,
                available,
            });
        }
        if self.ledger.headroom(&key) < amount_in {
            return Err(ProtocolError::AmountOutOfBounds {
                amount: amount_in,
                min: params.min_swap_amount,
                max: self.ledger.headroom(&key),
            });
        }

        let record = SwapRecord {
            amount_in,
            cross_amount: params.cross_amount(amount_in),
            relayer,
            route,
            requester: ctx.caller,
            src_message,
            dst_message,
            swap_nonce: self.swaps.next_swap_nonce(&relayer),
            nonce: self.locks.next_nonce(),
        };
        let swap_id = record.swap_id();

        let block = ctx.block_height;
        self.ledger.credit(key, amount_in, block, params.unstake_delay);

        let lock = Lock {
            lock_type: LockType::PendingReward,
            relayer,
            route,
            asset: key.asset,
            amount: lock_amount,
            requester: ctx.caller,
            counterparty: relayer,
            ref_hash: swap_id,
            maturity: ctx.block_height,
        };
        let (nonce, lock_event) = self.locks.create(&mut self.ledger, lock)?;
        debug_assert_eq!(nonce, record.nonce);

        self.swaps.bump_swap_nonce(relayer);
        self.swaps.records.insert(swap_id, record);

        info!(
            %swap_id,
            requester = %ctx.caller,
            %relayer,
            %route,
            %amount_in,
            %nonce,
            "opened swap"
        );

        Ok(CallOutput::with_events(vec![
            ProtocolEvent::Swap {
                requester: ctx.caller,
                relayer,
                route: route.discriminant(),
                swap_id,
            },
            lock_event,
        ]))
    }

    /// Delivers the cross amount of `record` to its requester on the destination network on
    /// behalf of `operator`, which must be the caller.
    ///
    /// The attached value must equal the record's cross amount. A bond of
    /// [`ProtocolParams::slash_penalty`] is locked on the relayer's destination stake until the
    /// relayer attests the fulfillment or the slash window passes.
    ///
    /// [`ProtocolParams::slash_penalty`]: bolt_bridge_params::prelude::ProtocolParams::slash_penalty
    pub fn fulfill(
        &mut self,
        ctx: &CallContext,
        record: &SwapRecord,
        operator: Address,
    ) -> ProtocolResult<CallOutput> {
        self.expect_side(record.route, RouteSide::Destination)?;

        if operator != ctx.caller {
            return Err(ProtocolError::OperatorNotCaller {
                operator,
                caller: ctx.caller,
            });
        }

        let swap_id = record.swap_id();
        if self.swaps.fulfillments.contains_key(&swap_id) {
            return Err(ProtocolError::AlreadyFulfilled(swap_id));
        }

        let params = *self.params();
        if record.cross_amount != params.cross_amount(record.amount_in) {
            return Err(ProtocolError::InconsistentRecord {
                swap_id,
                reason: format!(
                    "cross amount {} does not match {} for input {}",
                    record.cross_amount,
                    params.cross_amount(record.amount_in),
                    record.amount_in
                ),
            });
        }
        ctx.expect_value(record.cross_amount)?;

        let asset = record.dst_message.token_out;
        let bond = Lock {
            lock_type: LockType::FulfillBond,
            relayer: record.relayer,
            route: record.route,
            asset,
            amount: params.slash_penalty(record.amount_in),
            requester: operator,
            counterparty: record.relayer,
            ref_hash: swap_id,
            maturity: ctx.block_height.saturating_add(params.slash_window),
        };
        let (bond_nonce, lock_event) = self.locks.create(&mut self.ledger, bond)?;

        self.swaps.fulfillments.insert(
            swap_id,
            Fulfillment {
                operator,
                relayer: record.relayer,
                route: record.route,
                requester: record.requester,
                asset,
                cross_amount: record.cross_amount,
                bond_nonce,
                fulfilled_at: ctx.block_height,
                status: DestinationStatus::Fulfilled,
            },
        );

        info!(
            %swap_id,
            %operator,
            relayer = %record.relayer,
            cross_amount = %record.cross_amount,
            %bond_nonce,
            "fulfilled swap"
        );

        let mut duties = vec![Duty::Transfer {
            asset,
            to: record.requester,
            amount: record.cross_amount,
        }];
        if !record.dst_message.call_data.is_empty() {
            duties.push(Duty::ExecuteCall {
                target: record.dst_message.call_address,
                data: record.dst_message.call_data.clone(),
                requester: record.requester,
            });
        }

        Ok(CallOutput::with_duties_and_events(
            duties,
            vec![
                ProtocolEvent::Fulfill {
                    operator,
                    relayer: record.relayer,
                    route: record.route.discriminant(),
                    swap_id,
                },
                lock_event,
            ],
        ))
    }

    /// Returns the swap opened on this network under `swap_id`.
    pub fn swap_record(&self, swap_id: &SwapId) -> Option<&SwapRecord> {
        self.swaps.records.get(swap_id)
    }

    /// Returns the fulfillment observed on this network for `swap_id`.
    pub fn fulfillment(&self, swap_id: &SwapId) -> Option<&Fulfillment> {
        self.swaps.fulfillments.get(swap_id)
    }

    /// Returns the state of `swap_id` as observed by this instance.
    pub fn swap_state(&self, swap_id: &SwapId) -> Option<SwapState> {
        if let Some(record) = self.swaps.records.get(swap_id) {
            return Some(match self.locks.status(record.nonce) {
                LockStatus::Active | LockStatus::Unknown => SwapState::Created,
                LockStatus::Resolved(_) => SwapState::RewardReleased,
            });
        }

        self.swaps
            .fulfillments
            .get(swap_id)
            .map(|fulfillment| match fulfillment.status {
                DestinationStatus::Fulfilled => SwapState::Fulfilled,
                DestinationStatus::Relayed { .. } => SwapState::Relayed,
                DestinationStatus::Slashed => SwapState::Slashed,
            })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn record() -> SwapRecord {
        SwapRecord {
            amount_in: 1_000_000_000,
            cross_amount: 890_000_000,
            relayer: Address::new([1; 20]),
            route: Route::new(0u32, 1u32).unwrap(),
            requester: Address::new([2; 20]),
            src_message: SwapMessage::transfer(Address::new([3; 20]), Address::new([4; 20])),
            dst_message: SwapMessage::transfer(Address::new([3; 20]), Address::new([4; 20])),
            swap_nonce: 0,
            nonce: 1,
        }
    }

    #[test]
    fn swap_id_is_deterministic() {
        assert_eq!(record().swap_id(), record().clone().swap_id());
    }

    #[test]
    fn call_data_boundaries_are_unambiguous() {
        let mut a = record();
        a.src_message.call_data = vec![1, 2];
        a.dst_message.call_data = vec![3];

        let mut b = record();
        b.src_message.call_data = vec![1];
        b.dst_message.call_data = vec![2, 3];

        assert_ne!(a.swap_id(), b.swap_id());
    }

    #[test]
    fn record_serde_roundtrip() {
        let mut original = record();
        original.dst_message.call_data = vec![0xde, 0xad];

        let json = serde_json::to_string(&original).unwrap();
        let parsed: SwapRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(original, parsed);
        assert_eq!(original.swap_id(), parsed.swap_id());
    }

    proptest! {
        #[test]
        fn distinct_nonces_give_distinct_ids(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);

            let mut first = record();
            first.swap_nonce = a;
            let mut second = record();
            second.swap_nonce = b;

            prop_assert_ne!(first.swap_id(), second.swap_id());
        }

        #[test]
        fn every_field_is_committed(requester in any::<Address>(), amount_in in any::<Amount>()) {
            let base = record();
            let mut changed = base.clone();
            changed.requester = requester;
            changed.amount_in = amount_in;

            prop_assert_eq!(
                base.swap_id() == changed.swap_id(),
                base == changed
            );
        }
    }
}
