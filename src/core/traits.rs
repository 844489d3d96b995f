//! Core traits at the boundaries of the engine
//!
//! The settlement engine talks to two collaborators through these traits: the
//! host asset ledger that actually moves value, and the username resolver it
//! consults for payees and record labels.

use crate::types::{AccountId, Amount, AssetId, LedgerError, Transfer, Username};

/// Host asset-transfer primitive
///
/// Atomicity is delegated to the host: [`AssetLedger::apply_batch`] must apply
/// every leg or none of them. Implementations are shared between the registry
/// and the engine, so all methods take `&self`.
pub trait AssetLedger: Send + Sync {
    /// Current balance of `asset` held by `account`
    fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount;

    /// Apply a single transfer
    fn transfer(&self, transfer: Transfer) -> Result<(), LedgerError> {
        self.apply_batch(&[transfer])
    }

    /// Apply all legs atomically, in order
    ///
    /// Later legs may spend funds credited by earlier legs of the same batch.
    fn apply_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

/// Read-only view of the username registry
///
/// The settlement engine holds one of these and never mutates registry state.
pub trait UsernameResolver: Send + Sync {
    /// Account owning `username` (any casing), if any
    fn resolve(&self, username: &str) -> Option<AccountId>;

    /// Username owned by `account`, if any
    fn reverse_resolve(&self, account: AccountId) -> Option<Username>;

    /// The registry's own account, which is never a valid payee
    fn reserved_account(&self) -> AccountId;
}
