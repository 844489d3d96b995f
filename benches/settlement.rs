//! Benchmark suite for settlement throughput
//!
//! Uses the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! Scripted runs generate their input on the fly: one registration per payer
//! and payee, then a stream of payments by username and by account.

use divan::Bencher;
use rust_settlement_engine::core::compute_fee;
use rust_settlement_engine::runner::{RunnerSettings, ScriptRunner};
use rust_settlement_engine::{
    AccountId, AssetId, EngineConfig, EventBus, IdentityRegistry, InMemoryLedger,
    ReentrancyGuard, RegistryConfig, SettlementEngine,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

/// Fee arithmetic across the full amount range
#[divan::bench(args = [1u128, 100_000_000, u128::MAX])]
fn fee_computation(amount: u128) -> u128 {
    compute_fee(divan::black_box(amount), divan::black_box(50)).expect("valid bps")
}

/// Single settlement by username against a warm registry
#[divan::bench]
fn send_payment_by_username(bencher: Bencher) {
    let owner = AccountId::from_low_u64(0x0a);
    let payer = AccountId::from_low_u64(1);
    let usdc = AssetId::token(AccountId::from_low_u64(0xc0));

    let ledger = Arc::new(InMemoryLedger::new());
    let events = EventBus::default();
    let guard = Arc::new(ReentrancyGuard::new());
    let registry = Arc::new(
        IdentityRegistry::new(
            owner,
            RegistryConfig::default(),
            ledger.clone(),
            events.clone(),
            guard.clone(),
        )
        .expect("registry"),
    );
    let engine = SettlementEngine::new(
        owner,
        AccountId::from_low_u64(0xfe),
        EngineConfig::default(),
        ledger.clone(),
        registry.clone(),
        events,
        guard,
    )
    .expect("engine");
    engine.add_supported_asset(owner, usdc).expect("allowlist");
    registry
        .register_username("bob", AccountId::from_low_u64(2), AccountId::from_low_u64(2))
        .expect("register");
    ledger.mint(usdc, payer, u128::MAX / 2).expect("mint");

    bencher.bench_local(|| {
        engine
            .send_payment(payer, "Bob", usdc, 1_000_000)
            .expect("payment")
    });
}

fn generate_script(payments: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    let payer = AccountId::from_low_u64(1);
    writeln!(file, "op,caller,target,asset,amount").expect("write");
    writeln!(file, "mint,{},,native,1000000000", payer).expect("write");
    for user in 0..100u64 {
        let account = AccountId::from_low_u64(0x1000 + user);
        writeln!(file, "register,{},user_{},,", account, user).expect("write");
    }
    for n in 0..payments {
        let user = n as u64 % 100;
        if n % 2 == 0 {
            writeln!(file, "pay_native,{},User_{},,1.5", payer, user).expect("write");
        } else {
            let account = AccountId::from_low_u64(0x1000 + user);
            writeln!(file, "pay_native,{},{},,1.5", payer, account).expect("write");
        }
    }
    file.flush().expect("flush");
    file
}

/// Full scripted run: parse, settle, write balances
#[divan::bench(args = [100, 1_000, 10_000])]
fn scripted_run(bencher: Bencher, payments: usize) {
    let script = generate_script(payments);

    bencher.bench_local(|| {
        let runner = ScriptRunner::new(RunnerSettings::default()).expect("runner");
        let mut output = Vec::new();
        runner.run(script.path(), &mut output).expect("run");
        output
    });
}
