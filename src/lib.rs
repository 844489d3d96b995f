//! Rust Settlement Engine Library
//! # Overview
//!
//! This library provides a username registry and a payment settlement engine
//! that routes a basis-point fee to a configured recipient on every payment.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (accounts, assets, usernames, records, events, errors)
//! - [`config`] - Engine and registry configuration
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Case-insensitive username <-> account bijection
//!   - [`core::engine`] - Atomic, fee-skimming settlement
//!   - [`core::fees`] - Fee schedule with an immutable cap
//!   - [`core::events`] - Subscribable event stream
//!   - [`core::ledger`] - In-memory host ledger
//! - [`io`] - CSV script parsing and balance output
//! - [`runner`] - Drives registry and engine from a script
//! - [`cli`] - CLI arguments parsing
//!
//! # Payments
//!
//! A payment names its payee by username or by account. The engine checks, in
//! order, that the asset is allowlisted, the amount is positive, the payee
//! resolves, the payee is not the payer, and the engine is not paused. It then
//! moves `amount - fee` to the payee and `fee` to the fee recipient in one
//! all-or-nothing ledger batch.
//!
//! # Usernames
//!
//! Usernames are 1-32 characters of `[0-9A-Za-z_]`, stored lower-cased. Each
//! account holds at most one. Premium usernames can be transferred but never
//! renamed.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod runner;
pub mod types;

pub use config::{EngineConfig, RegistryConfig};
pub use core::{
    AssetLedger, EngineState, EventBus, IdentityRegistry, InMemoryLedger, ReentrancyGuard,
    SettlementEngine, Subscription, UsernameResolver,
};
pub use io::write_balances_csv;
pub use runner::{RunSummary, RunnerSettings, ScriptRunner};
pub use types::{
    AccountId, Amount, AssetId, EngineError, EngineEvent, FeeQuote, LedgerError, Recipient,
    Registration, Settlement, SettlementRecord, Transfer, TransferKind, Username,
};
