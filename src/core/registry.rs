//! Identity registry
//!
//! Maps normalized usernames to accounts and back. The registry exclusively
//! owns the username <-> account bijection; the settlement engine only reads it
//! through [`UsernameResolver`].
//!
//! The registry enforces:
//! - Case-insensitive identity (every read and write path normalizes first)
//! - At most one username per account and one account per username
//! - Premium usernames are transferable but never renamed
//! - Optional registration fees, paid by a fee payer that may differ from the
//!   new owner (sponsored registration)
//! - Owner-only administration of fees and fee withdrawal

use crate::config::RegistryConfig;
use crate::core::bimap::{Conflict, UsernameBiMap};
use crate::core::events::EventBus;
use crate::core::guard::ReentrancyGuard;
use crate::core::traits::{AssetLedger, UsernameResolver};
use crate::types::{
    AccountId, Amount, AssetId, Component, EngineError, EngineEvent, Registration, Transfer,
    TransferKind, Username,
};
use parking_lot::RwLock;
use std::sync::Arc;

struct RegistryState {
    owner: AccountId,
    names: UsernameBiMap,
    registration_fee: Amount,
    premium_fee: Amount,
}

/// Username registry backed by a host ledger for fee collection
pub struct IdentityRegistry {
    /// The registry's own account; collected fees accrue here
    account: AccountId,
    fee_asset: AssetId,
    ledger: Arc<dyn AssetLedger>,
    events: EventBus,
    guard: Arc<ReentrancyGuard>,
    state: RwLock<RegistryState>,
}

impl IdentityRegistry {
    /// Create an empty registry owned by `owner`
    ///
    /// `guard` is shared with the settlement engine so that neither component
    /// can be entered while the other is mid-operation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the registry account is the zero account and
    /// `InvalidAccount` if `owner` is the zero account.
    pub fn new(
        owner: AccountId,
        config: RegistryConfig,
        ledger: Arc<dyn AssetLedger>,
        events: EventBus,
        guard: Arc<ReentrancyGuard>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if owner.is_zero() {
            return Err(EngineError::invalid_account(owner, "registry owner"));
        }

        Ok(IdentityRegistry {
            account: config.registry_account,
            fee_asset: config.fee_asset,
            ledger,
            events,
            guard,
            state: RwLock::new(RegistryState {
                owner,
                names: UsernameBiMap::new(),
                registration_fee: config.registration_fee,
                premium_fee: config.premium_fee,
            }),
        })
    }

    /// The registry's own account
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn owner(&self) -> AccountId {
        self.state.read().owner
    }

    /// Asset registration fees are paid in
    pub fn fee_asset(&self) -> AssetId {
        self.fee_asset
    }

    pub fn registration_fee(&self) -> Amount {
        self.state.read().registration_fee
    }

    pub fn premium_fee(&self) -> Amount {
        self.state.read().premium_fee
    }

    /// Fees collected and not yet withdrawn
    pub fn collected_fees(&self) -> Amount {
        self.ledger.balance_of(self.fee_asset, self.account)
    }

    /// Number of registered usernames
    pub fn registered_count(&self) -> usize {
        self.state.read().names.len()
    }

    // ========== Registration ==========

    /// Register `username` for `owner`, charging the standard fee to `fee_payer`
    ///
    /// # Errors
    ///
    /// - `UsernameInvalid` if the username fails length/charset validation
    /// - `InvalidAccount` if `owner` is the zero account or the registry itself
    /// - `UsernameTaken` if any casing of the username is already registered
    /// - `OwnerAlreadyRegistered` if `owner` already holds a username
    /// - `FeeTransferFailed` if a non-zero fee cannot be collected
    pub fn register_username(
        &self,
        username: &str,
        owner: AccountId,
        fee_payer: AccountId,
    ) -> Result<Registration, EngineError> {
        let _token = self.guard.enter("register_username")?;
        self.register(username, owner, fee_payer, false)
    }

    /// Register a premium (rename-immutable) username
    ///
    /// Same preconditions as [`IdentityRegistry::register_username`], charging
    /// the premium fee instead.
    pub fn register_premium_username(
        &self,
        username: &str,
        owner: AccountId,
        fee_payer: AccountId,
    ) -> Result<Registration, EngineError> {
        let _token = self.guard.enter("register_premium_username")?;
        self.register(username, owner, fee_payer, true)
    }

    fn register(
        &self,
        raw: &str,
        owner: AccountId,
        fee_payer: AccountId,
        premium: bool,
    ) -> Result<Registration, EngineError> {
        let username = Username::parse(raw)?;
        self.check_holder(owner, "username owner")?;

        let fee = {
            let state = self.state.read();
            if state.names.contains_username(&username) {
                return Err(EngineError::username_taken(username.as_str()));
            }
            if state.names.contains_account(&owner) {
                return Err(EngineError::OwnerAlreadyRegistered { owner });
            }
            if premium {
                state.premium_fee
            } else {
                state.registration_fee
            }
        };

        // Fee is collected before the mapping is committed; a failed
        // collection leaves the registry untouched.
        if fee > 0 {
            self.ledger
                .transfer(Transfer {
                    asset: self.fee_asset,
                    from: fee_payer,
                    to: self.account,
                    amount: fee,
                    kind: TransferKind::Pull,
                })
                .map_err(|source| {
                    tracing::warn!(payer = %fee_payer, fee, error = %source, "Registration fee collection failed");
                    EngineError::FeeTransferFailed {
                        payer: fee_payer,
                        source,
                    }
                })?;
        }

        let registration = Registration {
            username,
            owner,
            premium,
        };
        self.state
            .write()
            .names
            .insert(registration.clone())
            .map_err(|conflict| self.conflict_error(conflict, &registration))?;

        tracing::info!(
            username = %registration.username,
            owner = %owner,
            payer = %fee_payer,
            fee,
            premium,
            "Username registered"
        );
        self.events.publish(EngineEvent::UsernameRegistered {
            username: registration.username.clone(),
            owner,
            fee_payer,
            fee,
            premium,
        });

        Ok(registration)
    }

    /// Rename `owner`'s username, freeing the old one
    ///
    /// # Errors
    ///
    /// - `NoUsernameToUpdate` if `owner` holds no username
    /// - `PremiumImmutable` if the current username is premium
    /// - `UsernameInvalid` / `UsernameTaken` for the new username
    pub fn update_username(
        &self,
        owner: AccountId,
        new_username: &str,
    ) -> Result<Registration, EngineError> {
        let _token = self.guard.enter("update_username")?;

        let mut state = self.state.write();
        let current = state
            .names
            .get_by_account(&owner)
            .ok_or(EngineError::NoUsernameToUpdate { owner })?;
        if current.premium {
            return Err(EngineError::premium_immutable(current.username.as_str()));
        }

        let new_username = Username::parse(new_username)?;
        let previous = state
            .names
            .rename(&owner, new_username.clone())
            .map_err(|_| EngineError::username_taken(new_username.as_str()))?
            .ok_or(EngineError::NoUsernameToUpdate { owner })?;
        drop(state);

        tracing::info!(
            owner = %owner,
            old = %previous.username,
            new = %new_username,
            "Username updated"
        );
        self.events.publish(EngineEvent::UsernameUpdated {
            owner,
            old_username: previous.username,
            new_username: new_username.clone(),
        });

        Ok(Registration {
            username: new_username,
            owner,
            premium: false,
        })
    }

    /// Move `owner`'s username to `recipient`, keeping the premium flag
    ///
    /// # Errors
    ///
    /// - `InvalidAccount` if `recipient` is the zero account or the registry itself
    /// - `NoUsernameToTransfer` if `owner` holds no username
    /// - `RecipientAlreadyRegistered` if `recipient` already holds one
    pub fn transfer_username(
        &self,
        owner: AccountId,
        recipient: AccountId,
    ) -> Result<Registration, EngineError> {
        let _token = self.guard.enter("transfer_username")?;
        self.check_holder(recipient, "username recipient")?;

        let mut state = self.state.write();
        if !state.names.contains_account(&owner) {
            return Err(EngineError::NoUsernameToTransfer { owner });
        }
        if state.names.contains_account(&recipient) {
            return Err(EngineError::RecipientAlreadyRegistered { recipient });
        }
        let moved = state
            .names
            .reassign(&owner, recipient)
            .map_err(|_| EngineError::RecipientAlreadyRegistered { recipient })?
            .ok_or(EngineError::NoUsernameToTransfer { owner })?;
        drop(state);

        tracing::info!(
            username = %moved.username,
            from = %owner,
            to = %recipient,
            "Username transferred"
        );
        self.events.publish(EngineEvent::UsernameTransferred {
            username: moved.username.clone(),
            from: owner,
            to: recipient,
        });

        Ok(moved)
    }

    // ========== Resolution ==========

    /// Account owning `username` in any casing
    ///
    /// Invalid or unregistered usernames resolve to `None`. A mapping that
    /// points at the registry's own account or the zero account is treated as
    /// not found.
    pub fn resolve(&self, username: &str) -> Option<AccountId> {
        let username = Username::parse(username).ok()?;
        let owner = self.state.read().names.get_by_username(&username)?.owner;

        // Guard against an aliased slot resolving to our own account
        if owner == self.account || owner.is_zero() {
            tracing::warn!(
                username = %username,
                owner = %owner,
                "Username resolved to a reserved account; treating as not found"
            );
            return None;
        }
        Some(owner)
    }

    /// Username owned by `account`
    pub fn reverse_resolve(&self, account: AccountId) -> Option<Username> {
        self.state
            .read()
            .names
            .get_by_account(&account)
            .map(|registration| registration.username.clone())
    }

    /// Whether `username` is valid and unregistered in every casing
    pub fn is_available(&self, username: &str) -> bool {
        match Username::parse(username) {
            Ok(username) => !self.state.read().names.contains_username(&username),
            Err(_) => false,
        }
    }

    /// Full registration record held by `account`
    pub fn registration(&self, account: AccountId) -> Option<Registration> {
        self.state.read().names.get_by_account(&account).cloned()
    }

    /// Full registration record for `username` in any casing
    pub fn registration_of(&self, username: &str) -> Option<Registration> {
        let username = Username::parse(username).ok()?;
        self.state.read().names.get_by_username(&username).cloned()
    }

    // ========== Administration ==========

    /// Set the standard registration fee (owner only)
    pub fn set_registration_fee(&self, caller: AccountId, fee: Amount) -> Result<(), EngineError> {
        let _token = self.guard.enter("set_registration_fee")?;
        let mut state = self.state.write();
        Self::ensure_owner(&state, caller, "set_registration_fee")?;
        state.registration_fee = fee;
        drop(state);

        tracing::info!(fee, "Registration fee updated");
        self.events.publish(EngineEvent::RegistrationFeeUpdated {
            fee,
            premium: false,
        });
        Ok(())
    }

    /// Set the premium registration fee (owner only)
    pub fn set_premium_fee(&self, caller: AccountId, fee: Amount) -> Result<(), EngineError> {
        let _token = self.guard.enter("set_premium_fee")?;
        let mut state = self.state.write();
        Self::ensure_owner(&state, caller, "set_premium_fee")?;
        state.premium_fee = fee;
        drop(state);

        tracing::info!(fee, "Premium fee updated");
        self.events.publish(EngineEvent::RegistrationFeeUpdated { fee, premium: true });
        Ok(())
    }

    /// Send every collected fee to `to` (owner only)
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if `caller` is not the owner
    /// - `InvalidAccount` if `to` is the zero account or the registry itself
    /// - `NoFeesToWithdraw` if nothing has been collected
    /// - `TransferFailed` if the host ledger refuses the transfer
    pub fn withdraw_fees(&self, caller: AccountId, to: AccountId) -> Result<Amount, EngineError> {
        let _token = self.guard.enter("withdraw_fees")?;
        Self::ensure_owner(&self.state.read(), caller, "withdraw_fees")?;
        self.check_holder(to, "fee withdrawal target")?;

        let amount = self.collected_fees();
        if amount == 0 {
            return Err(EngineError::NoFeesToWithdraw);
        }

        self.ledger
            .transfer(Transfer::push(self.fee_asset, self.account, to, amount))
            .map_err(|source| EngineError::transfer_failed("withdraw_fees", source))?;

        tracing::info!(to = %to, amount, asset = %self.fee_asset, "Registration fees withdrawn");
        self.events.publish(EngineEvent::FeesWithdrawn {
            to,
            asset: self.fee_asset,
            amount,
        });
        Ok(amount)
    }

    /// Hand registry ownership to `new_owner` (owner only)
    pub fn transfer_ownership(
        &self,
        caller: AccountId,
        new_owner: AccountId,
    ) -> Result<(), EngineError> {
        let _token = self.guard.enter("transfer_ownership")?;
        if new_owner.is_zero() {
            return Err(EngineError::invalid_account(new_owner, "registry owner"));
        }
        let mut state = self.state.write();
        Self::ensure_owner(&state, caller, "transfer_ownership")?;
        let old_owner = std::mem::replace(&mut state.owner, new_owner);
        drop(state);

        tracing::info!(old = %old_owner, new = %new_owner, "Registry ownership transferred");
        self.events.publish(EngineEvent::OwnershipTransferred {
            component: Component::Registry,
            old_owner,
            new_owner,
        });
        Ok(())
    }

    fn ensure_owner(
        state: &RegistryState,
        caller: AccountId,
        operation: &str,
    ) -> Result<(), EngineError> {
        if caller != state.owner {
            tracing::warn!(caller = %caller, operation, "Unauthorized registry call");
            return Err(EngineError::unauthorized(caller, operation));
        }
        Ok(())
    }

    fn check_holder(&self, account: AccountId, role: &str) -> Result<(), EngineError> {
        if account.is_zero() || account == self.account {
            return Err(EngineError::invalid_account(account, role));
        }
        Ok(())
    }

    fn conflict_error(&self, conflict: Conflict, registration: &Registration) -> EngineError {
        match conflict {
            Conflict::UsernameTaken => EngineError::username_taken(registration.username.as_str()),
            Conflict::AccountTaken => EngineError::OwnerAlreadyRegistered {
                owner: registration.owner,
            },
        }
    }
}

impl UsernameResolver for IdentityRegistry {
    fn resolve(&self, username: &str) -> Option<AccountId> {
        IdentityRegistry::resolve(self, username)
    }

    fn reverse_resolve(&self, account: AccountId) -> Option<Username> {
        IdentityRegistry::reverse_resolve(self, account)
    }

    fn reserved_account(&self) -> AccountId {
        self.account
    }
}
