//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account and asset identifiers, amounts, payees
//! - `username`: Username validation and normalization
//! - `record`: Transfers, registrations and settlement records
//! - `event`: Events published to subscribers
//! - `error`: Error types for the engine and the host ledger

pub mod account;
pub mod error;
pub mod event;
pub mod record;
pub mod username;

pub use account::{AccountId, Amount, AssetId, Recipient};
pub use error::{EngineError, LedgerError};
pub use event::{Component, EngineEvent};
pub use record::{
    FeeQuote, Registration, Settlement, SettlementRecord, Transfer, TransferKind,
};
pub use username::{Username, MAX_USERNAME_LENGTH};
