//! Errors that can occur while executing a call against a protocol instance.
//!
//! Every error is a synchronous rejection of the call that caused it: no state is committed when
//! a call fails.

use bolt_bridge_primitives::{Address, Amount, BlockHeight, LockNonce, NetworkId, Route, SwapId};
use thiserror::Error;

use crate::lock::LockType;

/// Errors that can occur in a protocol instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The route does not touch the local network, or the local network is on the wrong side of
    /// the route for the requested operation.
    #[error("route {route} is not valid for this call on network {network}")]
    RouteInvalid {
        /// The offending route.
        route: Route,
        /// The network of the instance that rejected the call.
        network: NetworkId,
    },

    /// The relayer does not have enough unlocked stake to cover the request.
    #[error("insufficient available stake: requested {requested}, available {available}")]
    InsufficientAvailable {
        /// The amount that was requested.
        requested: Amount,
        /// The amount that is currently available.
        available: Amount,
    },

    /// The call was made before the block from which it is permitted.
    #[error("too early: current block is {current}, permitted from block {permitted_at}")]
    TooEarly {
        /// The block at which the call was made.
        current: BlockHeight,
        /// The first block at which the call would succeed.
        permitted_at: BlockHeight,
    },

    /// The swap has already been fulfilled on this network.
    #[error("swap {0} has already been fulfilled")]
    AlreadyFulfilled(SwapId),

    /// A fulfillment names an operator other than the caller that delivers the funds.
    #[error("operator {operator} does not match caller {caller}")]
    OperatorNotCaller {
        /// The operator named in the call.
        operator: Address,
        /// The caller that attached the funds.
        caller: Address,
    },

    /// The relay attestation was not signed by the swap's relayer.
    #[error("relay signature for swap {swap_id} does not belong to relayer {expected}")]
    InvalidRelaySignature {
        /// The swap the attestation refers to.
        swap_id: SwapId,
        /// The relayer that was expected to sign.
        expected: Address,
        /// The address the signature recovered to, if it recovered at all.
        recovered: Option<Address>,
    },

    /// The slash proof does not contain a statement authored by the relayer.
    #[error("invalid slash proof for swap {swap_id}: {reason}")]
    InvalidSlashProof {
        /// The swap the proof refers to.
        swap_id: SwapId,
        /// Why the proof was rejected.
        reason: String,
    },

    /// The slash call does not match any rule that warrants a penalty.
    #[error("slash rule {rule_id} does not apply to swap {swap_id}: {reason}")]
    InvalidSlashRule {
        /// The rule identifier provided by the caller.
        rule_id: u8,
        /// The swap the call refers to.
        swap_id: SwapId,
        /// Why the rule does not apply.
        reason: String,
    },

    /// The lock nonce is not active, either because it was never issued or because the lock has
    /// already been resolved.
    #[error("lock {0} is unknown or already resolved")]
    UnknownOrResolved(LockNonce),

    /// The value attached to the call does not match the amount the call moves.
    #[error("attached value {attached} does not match the expected {expected}")]
    ValueMismatch {
        /// The value the call requires.
        expected: Amount,
        /// The value that was attached.
        attached: Amount,
    },

    /// The parallel argument lists of a call differ in length.
    #[error("got {routes} routes but {amounts} amounts")]
    ArityMismatch {
        /// The number of routes supplied.
        routes: usize,
        /// The number of amounts supplied.
        amounts: usize,
    },

    /// The swap input lies outside the configured bounds.
    #[error("swap amount {amount} outside of [{min}, {max}]")]
    AmountOutOfBounds {
        /// The requested swap input.
        amount: Amount,
        /// The smallest admissible input.
        min: Amount,
        /// The largest admissible input.
        max: Amount,
    },

    /// No swap with this identifier was created on this network.
    #[error("swap {0} is unknown on this network")]
    UnknownSwap(SwapId),

    /// The swap has not been fulfilled on this network.
    #[error("swap {0} has not been fulfilled on this network")]
    NotFulfilled(SwapId),

    /// A relay attestation has already been accepted for this swap.
    #[error("swap {0} has already been relayed")]
    AlreadyRelayed(SwapId),

    /// The relayer has already been slashed for this swap.
    #[error("swap {0} has already been slashed")]
    AlreadySlashed(SwapId),

    /// The lock cannot be resolved through the requested path.
    #[error("lock {nonce} of type {found:?} cannot be resolved this way")]
    WrongLockType {
        /// The lock nonce.
        nonce: LockNonce,
        /// The type of the lock.
        found: LockType,
    },

    /// The swap record presented on this network disagrees with the protocol parameters.
    #[error("swap record {swap_id} is inconsistent: {reason}")]
    InconsistentRecord {
        /// The identifier derived from the presented record.
        swap_id: SwapId,
        /// What is inconsistent.
        reason: String,
    },
}

/// The result type for operations on a protocol instance.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
