//! Event subscription from a consumer's point of view

mod common;

use common::{acct, usdc, World, ALICE, BOB, OWNER};
use futures::StreamExt;
use rust_settlement_engine::{EngineEvent, Username};

#[tokio::test]
async fn test_account_subscription_receives_settlement() {
    let world = World::with_alice_and_bob();
    let mut bob = world.engine.subscribe_account(acct(BOB));

    let settlement = world
        .engine
        .send_payment(acct(ALICE), "bob", usdc(), 100_000_000)
        .unwrap();

    let event = bob.next().await.unwrap();
    assert_eq!(event, EngineEvent::Settlement(settlement.record));
}

#[tokio::test]
async fn test_account_subscription_skips_unrelated_events() {
    let world = World::with_alice_and_bob();
    let mut bob = world.events.subscribe_account(acct(BOB));

    world.engine.pause(acct(OWNER)).unwrap();
    world.engine.unpause(acct(OWNER)).unwrap();
    world
        .registry
        .update_username(acct(BOB), "Robert")
        .unwrap();

    let event = bob.next().await.unwrap();
    assert_eq!(
        event,
        EngineEvent::UsernameUpdated {
            owner: acct(BOB),
            old_username: Username::parse("bob").unwrap(),
            new_username: Username::parse("robert").unwrap(),
        }
    );
    assert_eq!(bob.try_next(), None);
}

#[tokio::test]
async fn test_stream_sees_registry_and_engine_events_in_order() {
    let world = World::new();
    let stream = world.events.subscribe().into_stream();

    world
        .registry
        .register_username("alice", acct(ALICE), acct(ALICE))
        .unwrap();
    world.engine.set_global_fee_bps(acct(OWNER), 25).unwrap();

    let events: Vec<EngineEvent> = stream.take(2).collect().await;

    assert!(matches!(events[0], EngineEvent::UsernameRegistered { premium: false, fee: 0, .. }));
    assert_eq!(
        events[1],
        EngineEvent::GlobalFeeUpdated {
            old_bps: 50,
            new_bps: 25
        }
    );
}

#[tokio::test]
async fn test_stream_ends_when_publishers_dropped() {
    let world = World::new();
    let mut subscription = world.events.subscribe();
    drop(world);

    assert_eq!(subscription.next().await, None);
}
