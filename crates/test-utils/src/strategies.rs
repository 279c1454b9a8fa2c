//! `proptest` strategies for protocol inputs.

use bolt_bridge_primitives::Amount;
use proptest::{collection::vec, prelude::*, sample::select};

use crate::accounts::TestAccount;

/// One gwei in wei.
pub const GWEI: Amount = 1_000_000_000;

/// Swap inputs between the default minimum and 2 gwei, most of which a relayer staking 3 gwei
/// can back under the default parameters.
pub fn swap_amount() -> impl Strategy<Value = Amount> {
    1_000_000..=2 * GWEI
}

/// Post-delivery call payloads, empty about half of the time.
pub fn call_data() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![Just(Vec::new()), vec(any::<u8>(), 1..64)]
}

/// One of `size` named accounts.
pub fn account_pool(size: usize) -> impl Strategy<Value = TestAccount> {
    let accounts = (0..size.max(1))
        .map(|i| TestAccount::named(&format!("account-{i}")))
        .collect::<Vec<_>>();

    select(accounts)
}
