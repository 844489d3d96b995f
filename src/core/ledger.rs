//! In-memory host ledger
//!
//! This module provides [`InMemoryLedger`], a reference implementation of the
//! host asset-transfer primitive. The CLI runner, tests and benchmarks settle
//! against it.
//!
//! # Design
//!
//! Balances live in a `DashMap` keyed by `(asset, account)` so the ledger can be
//! shared behind an `Arc` by the registry and the engine. Batches are applied
//! under a commit lock: every leg is validated against a scratch copy of the
//! touched balances first, and only a fully valid batch is written back.
//!
//! # Transfer Hooks
//!
//! A ledger can carry a hook that runs after each committed batch, once per
//! leg. It stands in for the transfer hooks real assets run, i.e. untrusted code
//! that may try to call back into the engine mid-operation.

use crate::core::traits::AssetLedger;
use crate::types::{AccountId, Amount, AssetId, LedgerError, Transfer, TransferKind};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked for every committed transfer leg
pub type TransferHook = Arc<dyn Fn(&Transfer) + Send + Sync>;

/// Shared, in-memory asset ledger
#[derive(Default)]
pub struct InMemoryLedger {
    /// Balances by (asset, account); absent means zero
    balances: DashMap<(AssetId, AccountId), Amount>,

    /// Serializes batch commits so validation and write-back see the same state
    commit: Mutex<()>,

    hook: RwLock<Option<TransferHook>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `account` out of thin air
    ///
    /// This is the host layer funding accounts; it is not an engine operation.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if the credit would overflow the balance.
    pub fn mint(
        &self,
        asset: AssetId,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let _commit = self.commit.lock();
        let mut entry = self.balances.entry((asset, account)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account, asset })?;
        Ok(())
    }

    /// Install a hook that runs after each committed transfer leg
    pub fn set_hook(&self, hook: TransferHook) {
        *self.hook.write() = Some(hook);
    }

    /// Remove the transfer hook
    pub fn clear_hook(&self) {
        *self.hook.write() = None;
    }

    /// All non-zero balances sorted by account, then asset
    pub fn balances(&self) -> Vec<(AccountId, AssetId, Amount)> {
        let mut rows: Vec<(AccountId, AssetId, Amount)> = self
            .balances
            .iter()
            .filter(|entry| *entry.value() > 0)
            .map(|entry| {
                let (asset, account) = *entry.key();
                (account, asset, *entry.value())
            })
            .collect();
        rows.sort();
        rows
    }

    /// Sum of all balances of `asset`
    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|entry| entry.key().0 == asset)
            .fold(0u128, |acc, entry| acc.saturating_add(*entry.value()))
    }

    fn current(&self, key: &(AssetId, AccountId)) -> Amount {
        self.balances.get(key).map(|balance| *balance).unwrap_or(0)
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount {
        self.current(&(asset, account))
    }

    fn apply_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        {
            let _commit = self.commit.lock();

            // Validate every leg against a scratch copy of the touched balances
            let mut scratch: HashMap<(AssetId, AccountId), Amount> = HashMap::new();
            for transfer in transfers {
                let from_key = (transfer.asset, transfer.from);
                let to_key = (transfer.asset, transfer.to);

                let available = *scratch
                    .entry(from_key)
                    .or_insert_with(|| self.current(&from_key));
                if available < transfer.amount {
                    return Err(LedgerError::InsufficientBalance {
                        account: transfer.from,
                        asset: transfer.asset,
                        available,
                        requested: transfer.amount,
                    });
                }
                scratch.insert(from_key, available - transfer.amount);

                let credited = scratch
                    .entry(to_key)
                    .or_insert_with(|| self.current(&to_key));
                *credited =
                    credited
                        .checked_add(transfer.amount)
                        .ok_or(LedgerError::BalanceOverflow {
                            account: transfer.to,
                            asset: transfer.asset,
                        })?;
            }

            // Commit
            for (key, balance) in scratch {
                self.balances.insert(key, balance);
            }
        }

        // Hooks run outside the commit lock; they may call back into the ledger
        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            for transfer in transfers.iter().filter(|t| t.kind != TransferKind::Attached) {
                hook(transfer);
            }
        }

        Ok(())
    }
}
