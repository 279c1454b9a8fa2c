//! This crate contains the economic parameters that dictate the behavior of every protocol
//! instance in a way that ensures that instances on different networks agree on fees, collateral
//! and penalties without ever communicating.
//!
//! Both ends of a route must be deployed with identical
//! [`ProtocolParams`](protocol::ProtocolParams) for the cross-network accounting to line up.

mod default;
pub mod errors;
pub mod prelude;
pub mod protocol;
