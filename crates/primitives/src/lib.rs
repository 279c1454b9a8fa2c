//! This crate contains general types and pure functions that need to be shared across multiple
//! crates in the bridge.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod constants;
pub mod errors;
pub mod hash;
pub mod route;
pub mod serde_amount;
pub mod types;

pub use errors::PrimitiveError;
pub use route::{NetworkId, Route, RouteSide};
pub use types::{Address, Amount, BlockHeight, Hash32, LockNonce, SwapId, SwapNonce};
