//! Records produced by settlement and registration
//!
//! This module defines the value types that cross the engine boundary:
//! transfer legs handed to the host ledger, registry records, and the
//! settlement record emitted for every successful payment.

use super::account::{AccountId, Amount, AssetId};
use super::username::Username;
use serde::{Deserialize, Serialize};

/// How a transfer leg is funded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Pulled from the source account by the engine (fungible tokens)
    Pull,
    /// Value that accompanied the call (native asset)
    Attached,
    /// Pushed out of engine or registry custody
    Push,
}

/// A single asset movement on the host ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub asset: AssetId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub kind: TransferKind,
}

impl Transfer {
    /// Create a push leg
    pub fn push(asset: AssetId, from: AccountId, to: AccountId, amount: Amount) -> Self {
        Transfer {
            asset,
            from,
            to,
            amount,
            kind: TransferKind::Push,
        }
    }
}

/// Registry entry for one username
///
/// Premium registrations can change owner but never change name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: Username,
    pub owner: AccountId,
    pub premium: bool,
}

/// Settlement record, emitted exactly once per successful settlement
///
/// Username fields are empty when the account has no registered username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
    pub fee: Amount,
    pub from_username: String,
    pub to_username: String,
}

/// Result of a successful payment
///
/// `net_amount + fee == record.amount` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub fee: Amount,
    pub net_amount: Amount,
    pub record: SettlementRecord,
}

/// Fee split for an amount, without moving any funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub bps: u32,
    pub fee: Amount,
    pub net_amount: Amount,
}
