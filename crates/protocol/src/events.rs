//! The events emitted by a protocol instance.
//!
//! Routes are reported by their
//! [`Route::discriminant`](bolt_bridge_primitives::Route::discriminant) so that observers on
//! either network can index them with a single integer.

use std::fmt::Display;

use bolt_bridge_primitives::{Address, Amount, BlockHeight, Hash32, LockNonce, SwapId};
use serde::{Deserialize, Serialize};

use crate::{lock::LockType, settlement::SlashRule};

/// How a lock was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// The locked amount went back to the relayer's available stake.
    Returned,
    /// Part or all of the locked amount was paid out.
    Paid,
    /// Part or all of the locked amount was taken as a penalty.
    Slashed,
}

/// An observable fact about an accepted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// A relayer deposited stake on one or more routes.
    Stake {
        /// The relayer that staked.
        relayer: Address,
        /// The routes that were staked on.
        routes: Vec<u64>,
        /// The resulting staked balance on each route.
        amounts: Vec<Amount>,
        /// The staked asset.
        asset: Address,
    },

    /// A requester opened a swap on its source network.
    Swap {
        /// The requester.
        requester: Address,
        /// The relayer backing the swap.
        relayer: Address,
        /// The route of the swap.
        route: u64,
        /// The swap identifier.
        swap_id: SwapId,
    },

    /// An operator delivered the cross amount on the destination network.
    Fulfill {
        /// The fulfilling operator.
        operator: Address,
        /// The relayer backing the swap.
        relayer: Address,
        /// The route of the swap.
        route: u64,
        /// The swap identifier.
        swap_id: SwapId,
    },

    /// A relayer attestation was accepted on the destination network.
    Relay {
        /// The operator named by the attestation.
        operator: Address,
        /// The attesting relayer.
        relayer: Address,
        /// The route of the swap.
        route: u64,
        /// The swap identifier.
        swap_id: SwapId,
    },

    /// A relayer attestation was accepted on the source network and the reward was released.
    RelayReturn {
        /// The operator named by the attestation, and paid.
        operator: Address,
        /// The attesting relayer.
        relayer: Address,
        /// The route of the swap.
        route: u64,
        /// The swap identifier.
        swap_id: SwapId,
        /// The reward paid to the operator.
        amount: Amount,
    },

    /// Part of a relayer's stake was set aside.
    Lock {
        /// Why the stake was set aside.
        lock_type: LockType,
        /// The amount set aside.
        amount: Amount,
        /// The nonce of the new lock.
        nonce: LockNonce,
        /// The route of the debited stake account.
        route: u64,
        /// The asset of the debited stake account.
        asset: Address,
        /// The requester associated with the lock.
        requester: Address,
        /// The counterparty associated with the lock.
        counterparty: Address,
        /// The reference the lock belongs to, e.g. a swap identifier.
        ref_hash: Hash32,
        /// The block from which the lock may be resolved by maturity.
        maturity: BlockHeight,
    },

    /// A lock was resolved.
    LockResolved {
        /// The nonce of the resolved lock.
        nonce: LockNonce,
        /// How it was resolved.
        kind: ResolutionKind,
        /// The amount that left the relayer's stake.
        paid: Amount,
        /// Who received `paid`, if anything was paid.
        beneficiary: Option<Address>,
    },

    /// A relayer was penalized for a provably false attestation.
    Slash {
        /// The rule under which the penalty was applied.
        rule: SlashRule,
        /// The swap the false attestation refers to.
        swap_id: SwapId,
        /// The penalized relayer.
        relayer: Address,
        /// The operator that received the penalty.
        beneficiary: Address,
        /// The penalty taken.
        penalty: Amount,
    },
}

impl Display for ProtocolEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolEvent::Stake {
                relayer, routes, ..
            } => write!(f, "Stake by {relayer} on {} route(s)", routes.len()),
            ProtocolEvent::Swap { swap_id, .. } => write!(f, "Swap {swap_id}"),
            ProtocolEvent::Fulfill {
                swap_id, operator, ..
            } => write!(f, "Fulfill of {swap_id} by {operator}"),
            ProtocolEvent::Relay {
                swap_id, operator, ..
            } => write!(f, "Relay of {swap_id} naming {operator}"),
            ProtocolEvent::RelayReturn {
                swap_id,
                operator,
                amount,
                ..
            } => write!(f, "RelayReturn of {swap_id} paying {amount} to {operator}"),
            ProtocolEvent::Lock {
                lock_type,
                nonce,
                amount,
                ..
            } => write!(f, "Lock {nonce} ({lock_type:?}) of {amount}"),
            ProtocolEvent::LockResolved { nonce, kind, .. } => {
                write!(f, "LockResolved {nonce} ({kind:?})")
            }
            ProtocolEvent::Slash {
                swap_id, penalty, ..
            } => write!(f, "Slash of {penalty} for {swap_id}"),
        }
    }
}
