//! The lock registry: nonce-identified holds on a relayer's available stake.
//!
//! A lock moves part of a stake account from "available" to "locked" and records why. Every lock
//! is resolved exactly once, through one of the [`LockOutcome`]s, after which its nonce is
//! retired for good.

use std::collections::BTreeMap;

use bolt_bridge_primitives::{Address, Amount, BlockHeight, Hash32, LockNonce, Route};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::{ProtocolError, ProtocolResult},
    events::{ProtocolEvent, ResolutionKind},
    stake::{StakeKey, StakeLedger},
};

/// Why a lock was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// A withdrawal requested by the relayer, waiting for the withdrawal delay.
    PendingUnstake,
    /// Collateral backing the reward of a swap opened on this network.
    PendingReward,
    /// Collateral backing the honesty of a relayer's attestation for a swap fulfilled on this
    /// network.
    FulfillBond,
}

/// A hold on part of a relayer's stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Why the stake is held.
    pub lock_type: LockType,
    /// The relayer whose stake account is debited.
    pub relayer: Address,
    /// The route of the debited account.
    pub route: Route,
    /// The asset of the debited account.
    pub asset: Address,
    /// The amount held.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub amount: Amount,
    /// The requester associated with the hold.
    pub requester: Address,
    /// The counterparty associated with the hold.
    pub counterparty: Address,
    /// What the hold refers to; the swap identifier for swap-related locks.
    pub ref_hash: Hash32,
    /// The block from which the lock may be resolved by maturity.
    pub maturity: BlockHeight,
}

impl Lock {
    /// The stake account this lock debits.
    pub const fn stake_key(&self) -> StakeKey {
        StakeKey::new(self.relayer, self.route, self.asset)
    }

    /// Returns `true` if the lock has matured at `block_height`.
    pub const fn is_mature(&self, block_height: BlockHeight) -> bool {
        block_height >= self.maturity
    }

    fn event(&self, nonce: LockNonce) -> ProtocolEvent {
        ProtocolEvent::Lock {
            lock_type: self.lock_type,
            amount: self.amount,
            nonce,
            route: self.route.discriminant(),
            asset: self.asset,
            requester: self.requester,
            counterparty: self.counterparty,
            ref_hash: self.ref_hash,
            maturity: self.maturity,
        }
    }
}

/// How to resolve a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Release the whole amount back to the relayer's available stake.
    ReturnToOwner,

    /// Pay `amount` (at most the locked amount) to `beneficiary`; the rest goes back to the
    /// relayer's available stake.
    PayTo {
        /// The receiver of the payment.
        beneficiary: Address,
        /// The requested payment.
        amount: Amount,
    },

    /// Take `penalty` (at most the locked amount) from the relayer and pay it to `beneficiary`;
    /// the rest goes back to the relayer's available stake.
    ConvertToSlash {
        /// The receiver of the penalty.
        beneficiary: Address,
        /// The requested penalty.
        penalty: Amount,
    },
}

/// The result of resolving a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The nonce of the resolved lock.
    pub nonce: LockNonce,
    /// The lock as it was before resolution.
    pub lock: Lock,
    /// How it was resolved.
    pub kind: ResolutionKind,
    /// The amount that left the relayer's stake.
    pub paid: Amount,
    /// Who received `paid`.
    pub beneficiary: Option<Address>,
}

impl Resolution {
    /// The event describing this resolution.
    pub fn event(&self) -> ProtocolEvent {
        ProtocolEvent::LockResolved {
            nonce: self.nonce,
            kind: self.kind,
            paid: self.paid,
            beneficiary: self.beneficiary,
        }
    }
}

/// The lifecycle status of a lock nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// The nonce has never been issued.
    Unknown,
    /// The lock is holding stake.
    Active,
    /// The lock was resolved.
    Resolved(ResolutionKind),
}

/// All locks of a protocol instance.
#[derive(Debug, Clone)]
pub struct LockRegistry {
    next_nonce: LockNonce,
    active: BTreeMap<LockNonce, Lock>,
    resolved: BTreeMap<LockNonce, ResolutionKind>,
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self {
            next_nonce: 1,
            active: BTreeMap::new(),
            resolved: BTreeMap::new(),
        }
    }
}

impl LockRegistry {
    /// Returns the active lock with this nonce.
    pub fn get(&self, nonce: LockNonce) -> Option<&Lock> {
        self.active.get(&nonce)
    }

    /// Returns the status of a nonce.
    pub fn status(&self, nonce: LockNonce) -> LockStatus {
        if self.active.contains_key(&nonce) {
            LockStatus::Active
        } else if let Some(kind) = self.resolved.get(&nonce) {
            LockStatus::Resolved(*kind)
        } else {
            LockStatus::Unknown
        }
    }

    /// Iterates over active locks in nonce order.
    pub fn active(&self) -> impl Iterator<Item = (&LockNonce, &Lock)> {
        self.active.iter()
    }

    /// The nonce the next successfully created lock will receive.
    pub const fn next_nonce(&self) -> LockNonce {
        self.next_nonce
    }

    /// Reserves `lock.amount` of the relayer's available stake and registers the lock under a
    /// fresh nonce.
    pub(crate) fn create(
        &mut self,
        ledger: &mut StakeLedger,
        lock: Lock,
    ) -> ProtocolResult<(LockNonce, ProtocolEvent)> {
        ledger.reserve(&lock.stake_key(), lock.amount)?;

        let nonce = self.next_nonce;
        self.next_nonce += 1;

        debug!(
            %nonce,
            lock_type = ?lock.lock_type,
            amount = %lock.amount,
            relayer = %lock.relayer,
            "created lock"
        );

        let event = lock.event(nonce);
        self.active.insert(nonce, lock);

        Ok((nonce, event))
    }

    /// Shrinks the pending unstakes of `key`, oldest first, until `amount` is back in the
    /// available stake or none are left. Unstakes that shrink to nothing are retired as slashed.
    ///
    /// Returns the amount made available and the events of the retired locks.
    pub(crate) fn reclaim_unstakes(
        &mut self,
        ledger: &mut StakeLedger,
        key: &StakeKey,
        amount: Amount,
    ) -> (Amount, Vec<ProtocolEvent>) {
        let mut reclaimed: Amount = 0;
        let mut emptied = Vec::new();

        for (nonce, lock) in self.active.iter_mut() {
            if reclaimed == amount {
                break;
            }
            if lock.lock_type != LockType::PendingUnstake || lock.stake_key() != *key {
                continue;
            }

            let taken = lock.amount.min(amount - reclaimed);
            lock.amount -= taken;
            reclaimed += taken;
            if lock.amount == 0 {
                emptied.push(*nonce);
            }
        }

        ledger.settle(key, reclaimed, 0);

        let events = emptied
            .into_iter()
            .map(|nonce| {
                self.active.remove(&nonce);
                self.resolved.insert(nonce, ResolutionKind::Slashed);

                ProtocolEvent::LockResolved {
                    nonce,
                    kind: ResolutionKind::Slashed,
                    paid: 0,
                    beneficiary: None,
                }
            })
            .collect();

        if reclaimed > 0 {
            debug!(relayer = %key.relayer, %reclaimed, "reclaimed pending unstakes");
        }

        (reclaimed, events)
    }

    /// Resolves the active lock `nonce` according to `outcome`.
    pub(crate) fn resolve(
        &mut self,
        ledger: &mut StakeLedger,
        nonce: LockNonce,
        outcome: LockOutcome,
    ) -> ProtocolResult<Resolution> {
        let lock = self
            .active
            .remove(&nonce)
            .ok_or(ProtocolError::UnknownOrResolved(nonce))?;

        let (kind, paid, beneficiary) = match outcome {
            LockOutcome::ReturnToOwner => (ResolutionKind::Returned, 0, None),
            LockOutcome::PayTo {
                beneficiary,
                amount,
            } => (
                ResolutionKind::Paid,
                amount.min(lock.amount),
                Some(beneficiary),
            ),
            LockOutcome::ConvertToSlash {
                beneficiary,
                penalty,
            } => (
                ResolutionKind::Slashed,
                penalty.min(lock.amount),
                Some(beneficiary),
            ),
        };

        ledger.settle(&lock.stake_key(), lock.amount, paid);
        self.resolved.insert(nonce, kind);

        debug!(%nonce, ?kind, %paid, "resolved lock");

        Ok(Resolution {
            nonce,
            lock,
            kind,
            paid,
            beneficiary,
        })
    }
}
