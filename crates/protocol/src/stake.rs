//! The stake ledger: per `(relayer, route, asset)` collateral accounts, and the `stake` and
//! `unstake` calls that move value into and out of them.

use std::collections::BTreeMap;

use bolt_bridge_primitives::{Address, Amount, BlockHeight, Hash32, Route};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    bridge::RelayBridge,
    context::CallContext,
    errors::{ProtocolError, ProtocolResult},
    events::ProtocolEvent,
    lock::{Lock, LockType},
    output::CallOutput,
};

/// Identifies a stake account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StakeKey {
    /// The relayer that owns the stake.
    pub relayer: Address,
    /// The route the stake backs.
    pub route: Route,
    /// The staked asset.
    pub asset: Address,
}

impl StakeKey {
    /// Creates a new key.
    pub const fn new(relayer: Address, route: Route, asset: Address) -> Self {
        Self {
            relayer,
            route,
            asset,
        }
    }
}

/// The collateral a relayer has posted for one route and asset.
///
/// `locked <= staked` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAccount {
    /// The total amount held for the relayer.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub staked: Amount,
    /// The part of `staked` that is set aside by active locks.
    #[serde(with = "bolt_bridge_primitives::serde_amount")]
    pub locked: Amount,
    /// The block at which the account was created.
    pub first_stake_block: BlockHeight,
    /// The first block at which the relayer may request an unstake.
    pub unstake_enable_block: BlockHeight,
}

impl StakeAccount {
    /// The stake that can back new obligations.
    pub const fn available(&self) -> Amount {
        self.staked - self.locked
    }
}

/// All stake accounts of a protocol instance.
#[derive(Debug, Clone, Default)]
pub struct StakeLedger {
    accounts: BTreeMap<StakeKey, StakeAccount>,
}

impl StakeLedger {
    /// Returns the account for `key`, if it exists.
    pub fn account(&self, key: &StakeKey) -> Option<&StakeAccount> {
        self.accounts.get(key)
    }

    /// Returns the available stake for `key`, zero if the account does not exist.
    pub fn available(&self, key: &StakeKey) -> Amount {
        self.accounts
            .get(key)
            .map(StakeAccount::available)
            .unwrap_or_default()
    }

    /// Iterates over all accounts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StakeKey, &StakeAccount)> {
        self.accounts.iter()
    }

    /// The sum of all staked balances.
    pub fn total_staked(&self) -> Amount {
        self.accounts.values().map(|account| account.staked).sum()
    }

    /// The headroom left on the staked balance of `key` before it would overflow.
    pub(crate) fn headroom(&self, key: &StakeKey) -> Amount {
        Amount::MAX - self.accounts.get(key).map_or(0, |account| account.staked)
    }

    /// Adds `amount` to the staked balance of `key`, opening the account at `block_height` if it
    /// does not exist yet. Returns the new staked balance.
    ///
    /// Callers must have checked [`Self::headroom`].
    pub(crate) fn credit(
        &mut self,
        key: StakeKey,
        amount: Amount,
        block_height: BlockHeight,
        unstake_delay: BlockHeight,
    ) -> Amount {
        let account = self.accounts.entry(key).or_insert_with(|| StakeAccount {
            staked: 0,
            locked: 0,
            first_stake_block: block_height,
            unstake_enable_block: block_height.saturating_add(unstake_delay),
        });
        account.staked += amount;

        account.staked
    }

    /// Sets aside `amount` of the available stake of `key`.
    pub(crate) fn reserve(&mut self, key: &StakeKey, amount: Amount) -> ProtocolResult<()> {
        let available = self.available(key);
        if available < amount {
            return Err(ProtocolError::InsufficientAvailable {
                requested: amount,
                available,
            });
        }

        // an account with enough available stake necessarily exists unless `amount` is zero
        if let Some(account) = self.accounts.get_mut(key) {
            account.locked += amount;
        }

        Ok(())
    }

    /// Releases `locked_amount` previously reserved on `key` and removes `paid` of it from the
    /// staked balance. `paid` never exceeds `locked_amount`.
    pub(crate) fn settle(&mut self, key: &StakeKey, locked_amount: Amount, paid: Amount) {
        if let Some(account) = self.accounts.get_mut(key) {
            account.locked -= locked_amount;
            account.staked -= paid.min(locked_amount);
        }
    }
}

impl RelayBridge {
    /// Deposits stake for the caller on every route in `routes`, `amounts[i]` on `routes[i]`.
    ///
    /// The attached value must equal the sum of `amounts` and every route must touch the local
    /// network. The first stake on an account starts its unstake delay.
    pub fn stake(
        &mut self,
        ctx: &CallContext,
        routes: &[Route],
        amounts: &[Amount],
        asset: Address,
    ) -> ProtocolResult<CallOutput> {
        if routes.len() != amounts.len() {
            return Err(ProtocolError::ArityMismatch {
                routes: routes.len(),
                amounts: amounts.len(),
            });
        }

        for route in routes {
            self.require_route(*route)?;
        }

        let total = amounts
            .iter()
            .try_fold(0 as Amount, |acc, amount| acc.checked_add(*amount))
            .ok_or(ProtocolError::ValueMismatch {
                expected: Amount::MAX,
                attached: ctx.value,
            })?;
        ctx.expect_value(total)?;

        for route in routes {
            let key = StakeKey::new(ctx.caller, *route, asset);
            let headroom = self.ledger.headroom(&key);
            if headroom < total {
                return Err(ProtocolError::AmountOutOfBounds {
                    amount: total,
                    min: 0,
                    max: headroom,
                });
            }
        }

        let (block, delay) = (ctx.block_height, self.params().unstake_delay);
        let staked = routes
            .iter()
            .zip(amounts)
            .map(|(route, amount)| {
                let key = StakeKey::new(ctx.caller, *route, asset);
                self.ledger.credit(key, *amount, block, delay)
            })
            .collect::<Vec<_>>();

        info!(relayer = %ctx.caller, %asset, %total, routes = routes.len(), "accepted stake");

        Ok(CallOutput::with_events(vec![ProtocolEvent::Stake {
            relayer: ctx.caller,
            routes: routes.iter().map(Route::discriminant).collect(),
            amounts: staked,
            asset,
        }]))
    }

    /// Requests the withdrawal of `amount` of the caller's available stake on `route`.
    ///
    /// The amount is locked immediately and can be released with [`RelayBridge::unlock`] once
    /// the withdrawal delay has passed.
    pub fn unstake(
        &mut self,
        ctx: &CallContext,
        route: Route,
        amount: Amount,
        asset: Address,
    ) -> ProtocolResult<CallOutput> {
        self.require_route(route)?;

        let key = StakeKey::new(ctx.caller, route, asset);
        let account = self
            .ledger
            .account(&key)
            .ok_or(ProtocolError::InsufficientAvailable {
                requested: amount,
                available: 0,
            })?;

        if ctx.block_height < account.unstake_enable_block {
            return Err(ProtocolError::TooEarly {
                current: ctx.block_height,
                permitted_at: account.unstake_enable_block,
            });
        }

        let lock = Lock {
            lock_type: LockType::PendingUnstake,
            relayer: ctx.caller,
            route,
            asset,
            amount,
            requester: ctx.caller,
            counterparty: ctx.caller,
            ref_hash: Hash32::ZERO,
            maturity: ctx.block_height.saturating_add(self.params().withdraw_delay),
        };
        let (nonce, event) = self.locks.create(&mut self.ledger, lock)?;

        debug!(relayer = %ctx.caller, %route, %amount, %nonce, "queued unstake");

        Ok(CallOutput::with_events(vec![event]))
    }
}
