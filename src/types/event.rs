//! Events published by the registry and the settlement engine
//!
//! Downstream consumers (notifications, analytics) subscribe to these through
//! [`crate::core::EventBus`], optionally filtered to a single account.

use super::account::{AccountId, Amount, AssetId};
use super::record::SettlementRecord;
use super::username::Username;
use serde::{Deserialize, Serialize};

/// Which component emitted an admin event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Registry,
    Engine,
}

/// Every state change the engine and registry announce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A payment settled
    Settlement(SettlementRecord),

    UsernameRegistered {
        username: Username,
        owner: AccountId,
        fee_payer: AccountId,
        fee: Amount,
        premium: bool,
    },

    UsernameUpdated {
        owner: AccountId,
        old_username: Username,
        new_username: Username,
    },

    UsernameTransferred {
        username: Username,
        from: AccountId,
        to: AccountId,
    },

    RegistrationFeeUpdated { fee: Amount, premium: bool },

    FeesWithdrawn {
        to: AccountId,
        asset: AssetId,
        amount: Amount,
    },

    GlobalFeeUpdated { old_bps: u32, new_bps: u32 },

    AssetFeeOverrideUpdated { asset: AssetId, bps: u32 },

    FeeRecipientUpdated { old: AccountId, new: AccountId },

    AssetSupportUpdated { asset: AssetId, supported: bool },

    Paused { by: AccountId },

    Unpaused { by: AccountId },

    OwnershipTransferred {
        component: Component,
        old_owner: AccountId,
        new_owner: AccountId,
    },
}

impl EngineEvent {
    /// Whether `account` is a party to this event
    ///
    /// Admin-wide events (fee schedule, allowlist, pause) involve the acting or
    /// affected accounts only.
    pub fn involves(&self, account: &AccountId) -> bool {
        match self {
            EngineEvent::Settlement(record) => record.from == *account || record.to == *account,
            EngineEvent::UsernameRegistered {
                owner, fee_payer, ..
            } => owner == account || fee_payer == account,
            EngineEvent::UsernameUpdated { owner, .. } => owner == account,
            EngineEvent::UsernameTransferred { from, to, .. } => from == account || to == account,
            EngineEvent::FeesWithdrawn { to, .. } => to == account,
            EngineEvent::FeeRecipientUpdated { old, new } => old == account || new == account,
            EngineEvent::Paused { by } | EngineEvent::Unpaused { by } => by == account,
            EngineEvent::OwnershipTransferred {
                old_owner,
                new_owner,
                ..
            } => old_owner == account || new_owner == account,
            EngineEvent::RegistrationFeeUpdated { .. }
            | EngineEvent::GlobalFeeUpdated { .. }
            | EngineEvent::AssetFeeOverrideUpdated { .. }
            | EngineEvent::AssetSupportUpdated { .. } => false,
        }
    }
}
