//! Core business logic module
//!
//! This module contains the registry and settlement components:
//! - `traits` - Seams to the host ledger and the username resolver
//! - `registry` - Username <-> account identity registry
//! - `engine` - Fee-skimming settlement engine
//! - `fees` - Fee schedule and overflow-free fee arithmetic
//! - `controls` - Asset allowlist and circuit breaker state
//! - `bimap` - Paired username/account maps that cannot drift apart
//! - `guard` - Non-reentrant entry guard
//! - `events` - Broadcast event bus and subscriptions
//! - `ledger` - In-memory reference host ledger

pub mod bimap;
pub mod controls;
pub mod engine;
pub mod events;
pub mod fees;
pub mod guard;
pub mod ledger;
pub mod registry;
pub mod traits;

pub use controls::{AssetAllowlist, AssetListing, EngineState};
pub use engine::SettlementEngine;
pub use events::{EventBus, Subscription, DEFAULT_EVENT_CAPACITY};
pub use fees::{compute_fee, FeeSchedule, BPS_DENOMINATOR};
pub use guard::{GuardToken, ReentrancyGuard};
pub use ledger::{InMemoryLedger, TransferHook};
pub use registry::IdentityRegistry;
pub use traits::{AssetLedger, UsernameResolver};
