use std::thread;

use bolt_bridge_test_utils::prelude::ETH;

use super::*;
use crate::{call::Call, errors::ProtocolError, shared::SharedBridge};

#[test]
fn concurrent_swaps_never_overdraw_collateral() {
    let fixture = Fixture::new();
    let params = *fixture.src.params();
    let shared = SharedBridge::new(fixture.src.clone());

    let handles = (0..8)
        .map(|i| {
            let shared = shared.clone();
            let requester = TestAccount::named(&format!("requester-{i}")).address();
            let call = Call::Swap {
                amount_in: GWEI,
                relayer: fixture.relayer.address(),
                route: fixture.route,
                src_message: fixture.message(),
                dst_message: fixture.message(),
            };

            thread::spawn(move || {
                let ctx = CallContext::new(requester, SWAP_BLOCK).with_value(GWEI);
                shared.execute(&ctx, call)
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    // every accepted swap adds 1 gwei and locks 1.78 gwei: exactly two fit into 3 gwei
    let accepted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(accepted, 2);
    assert!(results.iter().all(|result| matches!(
        result,
        Ok(_) | Err(ProtocolError::InsufficientAvailable { .. })
    )));

    let available = shared.read(|bridge| {
        bridge.get_available_stake(fixture.relayer.address(), fixture.route, ETH)
    });
    assert_eq!(
        available,
        RELAYER_STAKE + 2 * GWEI - 2 * params.lock_amount(GWEI)
    );
}

#[test]
fn serialized_calls_execute_like_direct_calls() {
    let mut fixture = Fixture::new();
    let call = Call::Swap {
        amount_in: GWEI,
        relayer: fixture.relayer.address(),
        route: fixture.route,
        src_message: fixture.message(),
        dst_message: fixture.message(),
    };

    let json = serde_json::to_string(&call).unwrap();
    let decoded: Call = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, call);

    let ctx = fixture.user_ctx(GWEI);
    let via_call = fixture.src.clone().execute(&ctx, decoded).unwrap();
    let direct = fixture
        .src
        .swap(
            &ctx,
            GWEI,
            fixture.relayer.address(),
            fixture.route,
            fixture.message(),
            fixture.message(),
        )
        .unwrap();

    assert_eq!(via_call, direct);
}
