//! Shared setup for integration tests

#![allow(dead_code)]

use rust_settlement_engine::{
    AccountId, AssetId, EngineConfig, EventBus, IdentityRegistry, InMemoryLedger,
    ReentrancyGuard, RegistryConfig, SettlementEngine,
};
use std::sync::Arc;

pub const OWNER: u64 = 0x0a;
pub const FEE_RECIPIENT: u64 = 0xfe;
pub const ALICE: u64 = 0x01;
pub const BOB: u64 = 0x02;

pub fn acct(n: u64) -> AccountId {
    AccountId::from_low_u64(n)
}

pub fn usdc() -> AssetId {
    AssetId::token(acct(0xc0))
}

/// A registry and an engine sharing one ledger, one event bus and one guard
pub struct World {
    pub ledger: Arc<InMemoryLedger>,
    pub registry: Arc<IdentityRegistry>,
    pub engine: Arc<SettlementEngine>,
    pub events: EventBus,
}

impl World {
    pub fn new() -> Self {
        Self::with_configs(EngineConfig::default(), RegistryConfig::default())
    }

    pub fn with_configs(engine: EngineConfig, registry: RegistryConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let events = EventBus::default();
        let guard = Arc::new(ReentrancyGuard::new());
        let registry = Arc::new(
            IdentityRegistry::new(
                acct(OWNER),
                registry,
                ledger.clone(),
                events.clone(),
                guard.clone(),
            )
            .expect("registry"),
        );
        let engine = Arc::new(
            SettlementEngine::new(
                acct(OWNER),
                acct(FEE_RECIPIENT),
                engine,
                ledger.clone(),
                registry.clone(),
                events.clone(),
                guard,
            )
            .expect("engine"),
        );
        engine
            .add_supported_asset(acct(OWNER), usdc())
            .expect("allowlist usdc");
        engine
            .add_supported_asset(acct(OWNER), AssetId::NATIVE)
            .expect("allowlist native");

        World {
            ledger,
            registry,
            engine,
            events,
        }
    }

    /// Register `alice` and `bob` and fund alice with 1_000 USDC (6 decimals)
    pub fn with_alice_and_bob() -> Self {
        let world = Self::new();
        world
            .registry
            .register_username("alice", acct(ALICE), acct(ALICE))
            .expect("register alice");
        world
            .registry
            .register_username("bob", acct(BOB), acct(BOB))
            .expect("register bob");
        world
            .ledger
            .mint(usdc(), acct(ALICE), 1_000_000_000)
            .expect("mint");
        world
    }
}
