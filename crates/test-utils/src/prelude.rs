//! Re-exports of the most commonly used test utilities.

pub use crate::{
    accounts::{TestAccount, ETH},
    strategies::{account_pool, call_data, swap_amount, GWEI},
};
