//! The output of a successfully executed call.
//!
//! A protocol instance never moves value itself. Instead, every accepted call returns the
//! [`Duty`]s that the surrounding value-transfer primitive must perform together with the
//! [`ProtocolEvent`]s that observers (relayers, operators, the demo harness) react to.

use std::fmt::Display;

use bolt_bridge_primitives::{Address, Amount, SwapId};

use crate::events::ProtocolEvent;

/// An effect that must be carried out by the environment once a call has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Duty {
    /// Move `amount` of `asset` out of the protocol's custody to `to`.
    Transfer {
        /// The asset being moved.
        asset: Address,
        /// The receiving account.
        to: Address,
        /// The amount being moved.
        amount: Amount,
    },

    /// Invoke `target` with `data` on behalf of the requester of a fulfilled swap.
    ///
    /// The outcome of the invocation does not affect the fulfillment.
    ExecuteCall {
        /// The contract to invoke.
        target: Address,
        /// The opaque payload.
        data: Vec<u8>,
        /// The requester on whose behalf the call is made.
        requester: Address,
    },
}

impl Display for Duty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Duty::Transfer { asset, to, amount } => {
                write!(f, "Transfer {amount} of {asset} to {to}")
            }
            Duty::ExecuteCall {
                target,
                data,
                requester,
            } => write!(
                f,
                "ExecuteCall on {target} with {} bytes for {requester}",
                data.len()
            ),
        }
    }
}

/// The duties and events produced by a single accepted call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOutput {
    /// The value movements and invocations to perform, in order.
    pub duties: Vec<Duty>,
    /// The events emitted by the call, in order.
    pub events: Vec<ProtocolEvent>,
}

impl CallOutput {
    /// Creates a new empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an output with only events.
    pub const fn with_events(events: Vec<ProtocolEvent>) -> Self {
        Self {
            duties: Vec::new(),
            events,
        }
    }

    /// Creates an output with both duties and events.
    pub const fn with_duties_and_events(duties: Vec<Duty>, events: Vec<ProtocolEvent>) -> Self {
        Self { duties, events }
    }

    /// Returns the identifier of the swap created by this call, if any.
    pub fn swap_id(&self) -> Option<SwapId> {
        self.events.iter().find_map(|event| match event {
            ProtocolEvent::Swap { swap_id, .. } => Some(*swap_id),
            _ => None,
        })
    }

    /// Returns the total amount of `asset` that this call transfers to `to`.
    pub fn transferred_to(&self, asset: Address, to: Address) -> Amount {
        self.duties
            .iter()
            .map(|duty| match duty {
                Duty::Transfer {
                    asset: a,
                    to: t,
                    amount,
                } if *a == asset && *t == to => *amount,
                _ => 0,
            })
            .sum()
    }
}
