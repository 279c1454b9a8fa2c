//! Settlement of attested swaps and penalties for false attestations.
//!
//! On the source network an accepted attestation releases the swap's reward lock to the attested
//! operator. On the destination network, where the true fulfiller is known, an accepted
//! attestation naming that fulfiller releases the relayer's bond, while any attestation the
//! relayer signed for another operator is converted into a penalty paid to the fulfiller, whether
//! or not the bond is still in place.

use bolt_bridge_primitives::{Address, LockNonce, RouteSide, SwapId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    attestation::{recover_relay_signer, RelaySignature},
    bridge::RelayBridge,
    context::CallContext,
    errors::{ProtocolError, ProtocolResult},
    events::ProtocolEvent,
    lock::{Lock, LockOutcome, LockStatus, LockType},
    output::{CallOutput, Duty},
    stake::StakeKey,
    swap::{DestinationStatus, SwapRecord},
};

/// The rules under which a relayer can be penalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashRule {
    /// The presented attestation is not signed by the relayer.
    ///
    /// No penalty can ever be derived from a statement the relayer did not make, so this rule only
    /// exists to reject such proofs explicitly.
    InvalidSignature,

    /// The relayer signed an attestation naming an operator other than the one that fulfilled
    /// the swap.
    OperatorMismatch,
}

impl SlashRule {
    /// The wire identifier of the rule.
    pub const fn id(&self) -> u8 {
        match self {
            SlashRule::InvalidSignature => 1,
            SlashRule::OperatorMismatch => 2,
        }
    }
}

impl TryFrom<u8> for SlashRule {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SlashRule::InvalidSignature),
            2 => Ok(SlashRule::OperatorMismatch),
            other => Err(other),
        }
    }
}

impl RelayBridge {
    /// Accepts the relayer's attestation that `operator` fulfilled `swap_id` on this network.
    ///
    /// If `operator` is the recorded fulfiller the relayer's bond is released. Otherwise the bond
    /// stays in place so that the mismatch can be proven with [`RelayBridge::slash`].
    pub fn relay(
        &mut self,
        ctx: &CallContext,
        swap_id: SwapId,
        operator: Address,
        relayer: Address,
        signature: &RelaySignature,
    ) -> ProtocolResult<CallOutput> {
        let fulfillment = self
            .swaps
            .fulfillments
            .get(&swap_id)
            .ok_or(ProtocolError::NotFulfilled(swap_id))?;

        match fulfillment.status {
            DestinationStatus::Fulfilled => {}
            DestinationStatus::Relayed { .. } => {
                return Err(ProtocolError::AlreadyRelayed(swap_id))
            }
            DestinationStatus::Slashed => return Err(ProtocolError::AlreadySlashed(swap_id)),
        }

        check_attestation(&swap_id, &operator, &relayer, &fulfillment.relayer, signature)?;

        let honest = fulfillment.operator == operator;
        let bond_nonce = fulfillment.bond_nonce;
        let route = fulfillment.route;

        let mut events = vec![ProtocolEvent::Relay {
            operator,
            relayer,
            route: route.discriminant(),
            swap_id,
        }];

        // the bond may already have been released by maturity
        if honest && self.locks.status(bond_nonce) == LockStatus::Active {
            let resolution =
                self.locks
                    .resolve(&mut self.ledger, bond_nonce, LockOutcome::ReturnToOwner)?;
            events.push(resolution.event());
        }

        if let Some(fulfillment) = self.swaps.fulfillments.get_mut(&swap_id) {
            fulfillment.status = DestinationStatus::Relayed { operator };
        }

        if honest {
            info!(
                %swap_id,
                %operator,
                %relayer,
                caller = %ctx.caller,
                "accepted relay attestation"
            );
        } else {
            warn!(
                %swap_id,
                %operator,
                %relayer,
                "accepted relay attestation naming a non-fulfiller"
            );
        }

        Ok(CallOutput::with_events(events))
    }

    /// Pays the reward of `swap_id` to `operator` on the source network, given the relayer's
    /// attestation.
    ///
    /// The operator receives [`ProtocolParams::reward_amount`] out of the swap's reward lock; the
    /// rest of the lock returns to the relayer's available stake.
    ///
    /// [`ProtocolParams::reward_amount`]: bolt_bridge_params::prelude::ProtocolParams::reward_amount
    pub fn relay_return(
        &mut self,
        ctx: &CallContext,
        swap_id: SwapId,
        operator: Address,
        relayer: Address,
        signature: &RelaySignature,
    ) -> ProtocolResult<CallOutput> {
        let record = self
            .swaps
            .records
            .get(&swap_id)
            .ok_or(ProtocolError::UnknownSwap(swap_id))?;

        check_attestation(&swap_id, &operator, &relayer, &record.relayer, signature)?;

        let nonce = record.nonce;
        let route = record.route;
        let asset = record.src_message.token_in;
        let reward = self.params().reward_amount(record.amount_in);

        let resolution = self.locks.resolve(
            &mut self.ledger,
            nonce,
            LockOutcome::PayTo {
                beneficiary: operator,
                amount: reward,
            },
        )?;

        info!(
            %swap_id,
            %operator,
            %relayer,
            reward = %resolution.paid,
            caller = %ctx.caller,
            "released swap reward"
        );

        Ok(CallOutput::with_duties_and_events(
            vec![Duty::Transfer {
                asset,
                to: operator,
                amount: resolution.paid,
            }],
            vec![
                ProtocolEvent::RelayReturn {
                    operator,
                    relayer,
                    route: route.discriminant(),
                    swap_id,
                    amount: resolution.paid,
                },
                resolution.event(),
            ],
        ))
    }

    /// Penalises `relayer` for a signed attestation of `record` naming `alleged_operator`.
    ///
    /// Executes on the destination network, which holds the fulfillment and hence knows the true
    /// fulfiller. A penalty of [`ProtocolParams::slash_penalty`] is paid to the true fulfiller out
    /// of the relayer's bond for the swap. Once the bond has been released, by an honest relay or
    /// by maturity, the penalty is taken from the relayer's remaining destination stake instead,
    /// pending unstakes included, so that any other attestation the relayer signed for the swap
    /// stays punishable.
    ///
    /// [`ProtocolParams::slash_penalty`]: bolt_bridge_params::prelude::ProtocolParams::slash_penalty
    pub fn slash(
        &mut self,
        ctx: &CallContext,
        rule_id: u8,
        record: &SwapRecord,
        alleged_operator: Address,
        relayer: Address,
        signature: &RelaySignature,
    ) -> ProtocolResult<CallOutput> {
        let swap_id = record.swap_id();
        let rule = SlashRule::try_from(rule_id).map_err(|_| ProtocolError::InvalidSlashRule {
            rule_id,
            swap_id,
            reason: "unknown rule".to_string(),
        })?;

        if self.expect_side(record.route, RouteSide::Destination).is_err() {
            return Err(ProtocolError::InvalidSlashRule {
                rule_id,
                swap_id,
                reason: format!("network {} is not the destination of the swap", self.network()),
            });
        }

        let fulfillment = self.swaps.fulfillments.get(&swap_id).ok_or_else(|| {
            ProtocolError::InvalidSlashRule {
                rule_id,
                swap_id,
                reason: "the swap has not been fulfilled on this network".to_string(),
            }
        })?;

        if fulfillment.status == DestinationStatus::Slashed {
            return Err(ProtocolError::AlreadySlashed(swap_id));
        }

        let recovered = recover_relay_signer(&swap_id, &alleged_operator, signature).ok();
        if recovered != Some(relayer) || relayer != fulfillment.relayer {
            warn!(%swap_id, %relayer, ?recovered, "rejected slash proof");
            return Err(ProtocolError::InvalidSlashProof {
                swap_id,
                reason: format!(
                    "attestation is not signed by the relayer {} of the swap",
                    fulfillment.relayer
                ),
            });
        }

        if rule == SlashRule::InvalidSignature {
            return Err(ProtocolError::InvalidSlashRule {
                rule_id,
                swap_id,
                reason: "the attestation is validly signed".to_string(),
            });
        }

        if alleged_operator == fulfillment.operator {
            return Err(ProtocolError::InvalidSlashRule {
                rule_id,
                swap_id,
                reason: "the attestation names the true fulfiller".to_string(),
            });
        }

        let fulfiller = fulfillment.operator;
        let bond_nonce = fulfillment.bond_nonce;
        let key = StakeKey::new(relayer, fulfillment.route, fulfillment.asset);
        let penalty = self.params().slash_penalty(record.amount_in);

        let mut events = Vec::new();
        let nonce = if self.locks.status(bond_nonce) == LockStatus::Active {
            bond_nonce
        } else {
            // the bond is gone, so the penalty is seized from the remaining stake, including
            // stake still waiting to be withdrawn
            let shortfall = penalty.saturating_sub(self.ledger.available(&key));
            let (_, retired) = self.locks.reclaim_unstakes(&mut self.ledger, &key, shortfall);
            events.extend(retired);

            let seized = Lock {
                lock_type: LockType::FulfillBond,
                relayer,
                route: key.route,
                asset: key.asset,
                amount: penalty.min(self.ledger.available(&key)),
                requester: fulfiller,
                counterparty: relayer,
                ref_hash: swap_id,
                maturity: ctx.block_height,
            };
            let (nonce, event) = self.locks.create(&mut self.ledger, seized)?;
            events.push(event);

            nonce
        };

        let resolution = self.locks.resolve(
            &mut self.ledger,
            nonce,
            LockOutcome::ConvertToSlash {
                beneficiary: fulfiller,
                penalty,
            },
        )?;

        if let Some(fulfillment) = self.swaps.fulfillments.get_mut(&swap_id) {
            fulfillment.status = DestinationStatus::Slashed;
        }

        if resolution.paid < penalty {
            warn!(
                %swap_id,
                %relayer,
                %penalty,
                paid = %resolution.paid,
                "relayer stake does not cover the full penalty"
            );
        }
        info!(
            %swap_id,
            %relayer,
            %fulfiller,
            %alleged_operator,
            penalty = %resolution.paid,
            caller = %ctx.caller,
            "slashed relayer"
        );

        events.push(ProtocolEvent::Slash {
            rule,
            swap_id,
            relayer,
            beneficiary: fulfiller,
            penalty: resolution.paid,
        });
        events.push(resolution.event());

        let duties = if resolution.paid > 0 {
            vec![Duty::Transfer {
                asset: key.asset,
                to: fulfiller,
                amount: resolution.paid,
            }]
        } else {
            Vec::new()
        };

        Ok(CallOutput::with_duties_and_events(duties, events))
    }

    /// Resolves a matured lock.
    ///
    /// A matured pending unstake pays the locked amount out to the relayer. A fulfillment bond
    /// whose slash window has passed returns to the relayer's available stake. Anyone may call
    /// this.
    pub fn unlock(&mut self, ctx: &CallContext, nonce: LockNonce) -> ProtocolResult<CallOutput> {
        let lock = self
            .locks
            .get(nonce)
            .ok_or(ProtocolError::UnknownOrResolved(nonce))?;

        let outcome = match lock.lock_type {
            LockType::PendingUnstake => LockOutcome::PayTo {
                beneficiary: lock.relayer,
                amount: lock.amount,
            },
            LockType::FulfillBond => LockOutcome::ReturnToOwner,
            found @ LockType::PendingReward => {
                return Err(ProtocolError::WrongLockType { nonce, found })
            }
        };

        if !lock.is_mature(ctx.block_height) {
            return Err(ProtocolError::TooEarly {
                current: ctx.block_height,
                permitted_at: lock.maturity,
            });
        }

        let resolution = self.locks.resolve(&mut self.ledger, nonce, outcome)?;

        info!(
            %nonce,
            lock_type = ?resolution.lock.lock_type,
            paid = %resolution.paid,
            caller = %ctx.caller,
            "unlocked"
        );

        let duties = match resolution.beneficiary {
            Some(beneficiary) if resolution.paid > 0 => vec![Duty::Transfer {
                asset: resolution.lock.asset,
                to: beneficiary,
                amount: resolution.paid,
            }],
            _ => Vec::new(),
        };

        Ok(CallOutput::with_duties_and_events(
            duties,
            vec![resolution.event()],
        ))
    }
}

/// Checks that `signature` attests `(swap_id, operator)` and was produced by `relayer`, the
/// relayer recorded for the swap.
fn check_attestation(
    swap_id: &SwapId,
    operator: &Address,
    relayer: &Address,
    expected: &Address,
    signature: &RelaySignature,
) -> ProtocolResult<()> {
    let recovered = recover_relay_signer(swap_id, operator, signature).ok();

    if relayer != expected || recovered != Some(*expected) {
        warn!(%swap_id, %expected, ?recovered, "rejected relay attestation");
        return Err(ProtocolError::InvalidRelaySignature {
            swap_id: *swap_id,
            expected: *expected,
            recovered,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_roundtrip() {
        for rule in [SlashRule::InvalidSignature, SlashRule::OperatorMismatch] {
            assert_eq!(SlashRule::try_from(rule.id()), Ok(rule));
        }

        assert_eq!(SlashRule::try_from(0), Err(0));
        assert_eq!(SlashRule::try_from(3), Err(3));
    }
}
