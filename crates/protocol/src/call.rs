//! A serializable description of every state-changing call, so that calls can be replayed from
//! files or queued across threads.

use bolt_bridge_primitives::{Address, Amount, LockNonce, Route, SwapId};
use serde::{Deserialize, Serialize};

use crate::{
    attestation::RelaySignature,
    swap::{SwapMessage, SwapRecord},
};

/// A state-changing call on a [`RelayBridge`](crate::bridge::RelayBridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[expect(missing_docs)] // fields mirror the parameters of the corresponding methods
pub enum Call {
    /// See [`RelayBridge::stake`](crate::bridge::RelayBridge::stake).
    Stake {
        routes: Vec<Route>,
        amounts: Vec<Amount>,
        asset: Address,
    },
    /// See [`RelayBridge::unstake`](crate::bridge::RelayBridge::unstake).
    Unstake {
        route: Route,
        amount: Amount,
        asset: Address,
    },
    /// See [`RelayBridge::unlock`](crate::bridge::RelayBridge::unlock).
    Unlock { nonce: LockNonce },
    /// See [`RelayBridge::swap`](crate::bridge::RelayBridge::swap).
    Swap {
        amount_in: Amount,
        relayer: Address,
        route: Route,
        src_message: SwapMessage,
        dst_message: SwapMessage,
    },
    /// See [`RelayBridge::fulfill`](crate::bridge::RelayBridge::fulfill).
    Fulfill {
        record: SwapRecord,
        operator: Address,
    },
    /// See [`RelayBridge::relay`](crate::bridge::RelayBridge::relay).
    Relay {
        swap_id: SwapId,
        operator: Address,
        relayer: Address,
        signature: RelaySignature,
    },
    /// See [`RelayBridge::relay_return`](crate::bridge::RelayBridge::relay_return).
    RelayReturn {
        swap_id: SwapId,
        operator: Address,
        relayer: Address,
        signature: RelaySignature,
    },
    /// See [`RelayBridge::slash`](crate::bridge::RelayBridge::slash).
    Slash {
        rule_id: u8,
        record: SwapRecord,
        alleged_operator: Address,
        relayer: Address,
        signature: RelaySignature,
    },
}

impl Call {
    /// A short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Call::Stake { .. } => "stake",
            Call::Unstake { .. } => "unstake",
            Call::Unlock { .. } => "unlock",
            Call::Swap { .. } => "swap",
            Call::Fulfill { .. } => "fulfill",
            Call::Relay { .. } => "relay",
            Call::RelayReturn { .. } => "relay_return",
            Call::Slash { .. } => "slash",
        }
    }
}
