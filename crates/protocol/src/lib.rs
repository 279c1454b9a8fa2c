//! The relayer-collateralized cross-network swap protocol.
//!
//! One [`RelayBridge`] runs on each network. A relayer stakes collateral per route; a requester
//! opens a swap on the source network against that collateral; any operator fulfills it on the
//! destination network; the relayer attests who fulfilled it, and that attestation is replayed on
//! both networks to release the relayer's bond and to reimburse the operator. An attestation that
//! names the wrong operator can be proven on the destination network and costs the relayer a
//! penalty paid to the true fulfiller.
//!
//! The instance never moves value by itself: every accepted call returns the [`Duty`]s to be
//! carried out by the environment along with the [`ProtocolEvent`]s it emitted.

pub mod attestation;
pub mod bridge;
pub mod call;
pub mod context;
pub mod errors;
pub mod events;
pub mod lock;
pub mod output;
pub mod settlement;
pub mod shared;
pub mod stake;
pub mod swap;

#[cfg(test)]
mod tests;

pub use attestation::{RecoveryError, RelaySignature};
pub use bridge::RelayBridge;
pub use call::Call;
pub use context::CallContext;
pub use errors::{ProtocolError, ProtocolResult};
pub use events::ProtocolEvent;
pub use output::{CallOutput, Duty};
pub use shared::SharedBridge;
