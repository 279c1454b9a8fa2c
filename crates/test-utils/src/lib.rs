//! This crate provides test-utilities shared by the crates in this workspace.
//!
//! Accounts are derived deterministically from names so that tests and the simulator agree on
//! addresses without sharing any state.

pub mod accounts;
pub mod prelude;
pub mod strategies;
