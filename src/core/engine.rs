//! Settlement engine
//!
//! This module provides the [`SettlementEngine`] that moves value from a payer
//! to a payee, skimming a basis-point fee to the configured fee recipient.
//!
//! The engine enforces business rules such as:
//! - Ordered payment preconditions, each with its own error
//! - An immutable fee cap over the global rate and every per-asset override
//! - A manually toggled circuit breaker that fails value-moving calls closed
//! - All-or-nothing settlement delegated to [`AssetLedger::apply_batch`]
//!
//! # Settlement Legs
//!
//! Every payment is one ledger batch:
//!
//! ```text
//! payer        -> engine         amount      (pull, or attached for native)
//! engine       -> payee          amount - fee
//! engine       -> fee recipient  fee         (omitted when fee == 0)
//! ```

use crate::config::EngineConfig;
use crate::core::controls::{AssetAllowlist, AssetListing, EngineState};
use crate::core::events::{EventBus, Subscription};
use crate::core::fees::FeeSchedule;
use crate::core::guard::ReentrancyGuard;
use crate::core::traits::{AssetLedger, UsernameResolver};
use crate::types::{
    AccountId, Amount, AssetId, Component, EngineError, EngineEvent, FeeQuote, Recipient,
    Settlement, SettlementRecord, Transfer, TransferKind,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Mutable engine state, changed only through the owner-gated admin API
struct Controls {
    owner: AccountId,
    fees: FeeSchedule,
    assets: AssetAllowlist,
    state: EngineState,
}

/// Payment settlement engine
///
/// Holds a read-only view of the identity registry; it never mutates username
/// mappings.
pub struct SettlementEngine {
    config: EngineConfig,
    ledger: Arc<dyn AssetLedger>,
    resolver: Arc<dyn UsernameResolver>,
    events: EventBus,
    guard: Arc<ReentrancyGuard>,
    controls: RwLock<Controls>,
}

impl SettlementEngine {
    /// Create an active engine with an empty allowlist
    ///
    /// # Arguments
    ///
    /// * `owner` - Account allowed to call the admin API
    /// * `fee_recipient` - Account credited with fees
    /// * `config` - Fee cap, initial fee and capability flags
    /// * `ledger` - Host ledger that moves value
    /// * `resolver` - Username lookups for payees and record labels
    /// * `events` - Bus settlement and admin events are published to
    /// * `guard` - Entry guard shared with the registry
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the config does not validate
    /// - `InvalidAccount` if `owner` is the zero account, or `fee_recipient` is
    ///   the zero account or the engine's custody account
    pub fn new(
        owner: AccountId,
        fee_recipient: AccountId,
        config: EngineConfig,
        ledger: Arc<dyn AssetLedger>,
        resolver: Arc<dyn UsernameResolver>,
        events: EventBus,
        guard: Arc<ReentrancyGuard>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if owner.is_zero() {
            return Err(EngineError::invalid_account(owner, "engine owner"));
        }
        if fee_recipient == config.engine_account {
            return Err(EngineError::invalid_account(fee_recipient, "fee recipient"));
        }
        let fees = FeeSchedule::new(config.fee_cap_bps, config.initial_fee_bps, fee_recipient)?;

        tracing::info!(
            owner = %owner,
            fee_recipient = %fee_recipient,
            fee_bps = config.initial_fee_bps,
            cap_bps = config.fee_cap_bps,
            native = config.native_asset_enabled,
            "Settlement engine created"
        );

        Ok(SettlementEngine {
            config,
            ledger,
            resolver,
            events,
            guard,
            controls: RwLock::new(Controls {
                owner,
                fees,
                assets: AssetAllowlist::new(),
                state: EngineState::Active,
            }),
        })
    }

    // ========== Payments ==========

    /// Pay `amount` of `asset` from `from` to the owner of `to_username`
    ///
    /// # Errors
    ///
    /// Preconditions are checked in this order:
    /// 1. `AssetNotSupported` - asset not on the allowlist
    /// 2. `ZeroAmount` - amount is zero
    /// 3. `RecipientNotFound` - username does not resolve
    /// 4. `SelfPaymentDisallowed` - username resolves to `from`
    /// 5. `EnginePaused` - circuit breaker engaged
    ///
    /// A host ledger failure surfaces as `TransferFailed` with no funds moved.
    pub fn send_payment(
        &self,
        from: AccountId,
        to_username: &str,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Settlement, EngineError> {
        let _token = self.guard.enter("send_payment")?;
        self.settle(from, &Recipient::Username(to_username.to_string()), asset, amount)
    }

    /// Pay `amount` of `asset` from `from` directly to `to`
    ///
    /// Same contract as [`SettlementEngine::send_payment`]. The registry is
    /// consulted only to label the record. The zero account and the engine's
    /// own account are not payable and yield `RecipientNotFound`.
    pub fn send_payment_to_address(
        &self,
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Settlement, EngineError> {
        let _token = self.guard.enter("send_payment_to_address")?;
        self.settle(from, &Recipient::Account(to), asset, amount)
    }

    /// Pay native value that accompanies the call to `to_username`
    ///
    /// Fails with `AssetNotSupported` when the native capability is disabled or
    /// the native asset is not on the allowlist.
    pub fn send_native_payment(
        &self,
        from: AccountId,
        to_username: &str,
        value: Amount,
    ) -> Result<Settlement, EngineError> {
        let _token = self.guard.enter("send_native_payment")?;
        self.settle(
            from,
            &Recipient::Username(to_username.to_string()),
            AssetId::NATIVE,
            value,
        )
    }

    /// Pay native value that accompanies the call directly to `to`
    pub fn send_native_payment_to_address(
        &self,
        from: AccountId,
        to: AccountId,
        value: Amount,
    ) -> Result<Settlement, EngineError> {
        let _token = self.guard.enter("send_native_payment_to_address")?;
        self.settle(from, &Recipient::Account(to), AssetId::NATIVE, value)
    }

    /// Pay a username or an account, routing native value to the native
    /// entry points
    pub fn pay(
        &self,
        from: AccountId,
        to: &Recipient,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Settlement, EngineError> {
        match (to, asset.is_native()) {
            (Recipient::Username(name), false) => self.send_payment(from, name, asset, amount),
            (Recipient::Account(account), false) => {
                self.send_payment_to_address(from, *account, asset, amount)
            }
            (Recipient::Username(name), true) => self.send_native_payment(from, name, amount),
            (Recipient::Account(account), true) => {
                self.send_native_payment_to_address(from, *account, amount)
            }
        }
    }

    fn settle(
        &self,
        from: AccountId,
        to: &Recipient,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Settlement, EngineError> {
        let (payee, quote, fee_recipient) = self.check_payment(from, to, asset, amount)?;
        // Labels reflect the registry as it stood when the payment was checked
        let from_username = self.label(from);
        let to_username = self.label(payee);

        let funding = if asset.is_native() {
            TransferKind::Attached
        } else {
            TransferKind::Pull
        };
        let custody = self.config.engine_account;

        let mut legs = Vec::with_capacity(3);
        legs.push(Transfer {
            asset,
            from,
            to: custody,
            amount,
            kind: funding,
        });
        legs.push(Transfer::push(asset, custody, payee, quote.net_amount));
        if quote.fee > 0 {
            legs.push(Transfer::push(asset, custody, fee_recipient, quote.fee));
        }

        self.ledger.apply_batch(&legs).map_err(|source| {
            tracing::warn!(from = %from, to = %payee, %asset, amount, error = %source, "Settlement failed");
            EngineError::transfer_failed("settlement", source)
        })?;

        let record = SettlementRecord {
            from,
            to: payee,
            asset,
            amount,
            fee: quote.fee,
            from_username,
            to_username,
        };

        tracing::info!(
            from = %from,
            to = %payee,
            %asset,
            amount,
            fee = quote.fee,
            net = quote.net_amount,
            "Payment settled"
        );
        self.events.publish(EngineEvent::Settlement(record.clone()));

        Ok(Settlement {
            fee: quote.fee,
            net_amount: quote.net_amount,
            record,
        })
    }

    /// Run the ordered precondition checks and price the payment
    ///
    /// Returns the resolved payee, the fee quote and the fee recipient.
    fn check_payment(
        &self,
        from: AccountId,
        to: &Recipient,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(AccountId, FeeQuote, AccountId), EngineError> {
        let controls = self.controls.read();

        let native_disabled = asset.is_native() && !self.config.native_asset_enabled;
        if native_disabled || !controls.assets.is_supported(asset) {
            return Err(EngineError::AssetNotSupported { asset });
        }
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }

        let payee = self
            .resolve_payee(to)
            .ok_or_else(|| EngineError::recipient_not_found(to))?;
        if payee == from {
            return Err(EngineError::SelfPaymentDisallowed { account: from });
        }
        if controls.state.is_paused() {
            return Err(EngineError::EnginePaused);
        }

        let quote = controls.fees.quote(asset, amount)?;
        Ok((payee, quote, controls.fees.recipient()))
    }

    fn resolve_payee(&self, to: &Recipient) -> Option<AccountId> {
        let account = match to {
            Recipient::Username(name) => self.resolver.resolve(name)?,
            Recipient::Account(account) => *account,
        };
        if account.is_zero()
            || account == self.config.engine_account
            || account == self.resolver.reserved_account()
        {
            return None;
        }
        Some(account)
    }

    fn label(&self, account: AccountId) -> String {
        self.resolver
            .reverse_resolve(account)
            .map(|username| username.into_string())
            .unwrap_or_default()
    }

    // ========== Administration ==========

    /// Set the global fee rate (owner only)
    ///
    /// # Errors
    ///
    /// Returns `FeeExceedsCap` if `bps` is above the immutable cap; the previous
    /// rate stays in effect.
    pub fn set_global_fee_bps(&self, caller: AccountId, bps: u32) -> Result<(), EngineError> {
        let _token = self.guard.enter("set_global_fee_bps")?;
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, "set_global_fee_bps")?;
        let old_bps = controls.fees.set_global_bps(bps).map_err(|error| {
            tracing::warn!(bps, error = %error, "Global fee update rejected");
            error
        })?;
        drop(controls);

        tracing::info!(old_bps, new_bps = bps, "Global fee updated");
        self.events.publish(EngineEvent::GlobalFeeUpdated {
            old_bps,
            new_bps: bps,
        });
        Ok(())
    }

    /// Set a per-asset fee override (owner only); `0` defers to the global rate
    pub fn set_asset_fee_override(
        &self,
        caller: AccountId,
        asset: AssetId,
        bps: u32,
    ) -> Result<(), EngineError> {
        let _token = self.guard.enter("set_asset_fee_override")?;
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, "set_asset_fee_override")?;
        controls.fees.set_override(asset, bps)?;
        drop(controls);

        tracing::info!(%asset, bps, "Asset fee override updated");
        self.events
            .publish(EngineEvent::AssetFeeOverrideUpdated { asset, bps });
        Ok(())
    }

    /// Change the fee recipient (owner only)
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` for the zero account and for the engine's own
    /// custody account.
    pub fn set_fee_recipient(&self, caller: AccountId, recipient: AccountId) -> Result<(), EngineError> {
        let _token = self.guard.enter("set_fee_recipient")?;
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, "set_fee_recipient")?;
        if recipient == self.config.engine_account {
            return Err(EngineError::invalid_account(recipient, "fee recipient"));
        }
        let old = controls.fees.set_recipient(recipient)?;
        drop(controls);

        tracing::info!(old = %old, new = %recipient, "Fee recipient updated");
        self.events
            .publish(EngineEvent::FeeRecipientUpdated { old, new: recipient });
        Ok(())
    }

    /// Put `asset` on the allowlist (owner only)
    ///
    /// Returns `true` if the asset was not already supported.
    pub fn add_supported_asset(&self, caller: AccountId, asset: AssetId) -> Result<bool, EngineError> {
        self.set_asset_support(caller, asset, true)
    }

    /// Take `asset` off the allowlist (owner only)
    ///
    /// The asset stays in the listing history. Returns `true` if it was
    /// supported before the call.
    pub fn remove_supported_asset(
        &self,
        caller: AccountId,
        asset: AssetId,
    ) -> Result<bool, EngineError> {
        self.set_asset_support(caller, asset, false)
    }

    fn set_asset_support(
        &self,
        caller: AccountId,
        asset: AssetId,
        supported: bool,
    ) -> Result<bool, EngineError> {
        let operation = if supported {
            "add_supported_asset"
        } else {
            "remove_supported_asset"
        };
        let _token = self.guard.enter(operation)?;
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, operation)?;
        let changed = if supported {
            controls.assets.add(asset)
        } else {
            controls.assets.remove(asset)
        };
        drop(controls);

        if changed {
            tracing::info!(%asset, supported, "Asset support updated");
            self.events
                .publish(EngineEvent::AssetSupportUpdated { asset, supported });
        }
        Ok(changed)
    }

    /// Engage the circuit breaker (owner only); pausing twice is a no-op
    pub fn pause(&self, caller: AccountId) -> Result<(), EngineError> {
        self.set_state(caller, EngineState::Paused)
    }

    /// Release the circuit breaker (owner only)
    pub fn unpause(&self, caller: AccountId) -> Result<(), EngineError> {
        self.set_state(caller, EngineState::Active)
    }

    fn set_state(&self, caller: AccountId, target: EngineState) -> Result<(), EngineError> {
        let operation = match target {
            EngineState::Paused => "pause",
            EngineState::Active => "unpause",
        };
        let _token = self.guard.enter(operation)?;
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, operation)?;
        let previous = std::mem::replace(&mut controls.state, target);
        drop(controls);

        if previous == target {
            tracing::debug!(state = ?target, "Engine state unchanged");
            return Ok(());
        }

        tracing::info!(by = %caller, state = ?target, "Engine state changed");
        self.events.publish(match target {
            EngineState::Paused => EngineEvent::Paused { by: caller },
            EngineState::Active => EngineEvent::Unpaused { by: caller },
        });
        Ok(())
    }

    /// Hand engine ownership to `new_owner` (owner only)
    pub fn transfer_ownership(&self, caller: AccountId, new_owner: AccountId) -> Result<(), EngineError> {
        let _token = self.guard.enter("transfer_ownership")?;
        if new_owner.is_zero() {
            return Err(EngineError::invalid_account(new_owner, "engine owner"));
        }
        let mut controls = self.controls.write();
        Self::ensure_owner(&controls, caller, "transfer_ownership")?;
        let old_owner = std::mem::replace(&mut controls.owner, new_owner);
        drop(controls);

        tracing::info!(old = %old_owner, new = %new_owner, "Engine ownership transferred");
        self.events.publish(EngineEvent::OwnershipTransferred {
            component: Component::Engine,
            old_owner,
            new_owner,
        });
        Ok(())
    }

    fn ensure_owner(controls: &Controls, caller: AccountId, operation: &str) -> Result<(), EngineError> {
        if caller != controls.owner {
            tracing::warn!(caller = %caller, operation, "Unauthorized engine call");
            return Err(EngineError::unauthorized(caller, operation));
        }
        Ok(())
    }

    // ========== Queries ==========

    /// Snapshot of the fee schedule
    pub fn fee_schedule(&self) -> FeeSchedule {
        self.controls.read().fees.clone()
    }

    pub fn effective_fee_bps(&self, asset: AssetId) -> u32 {
        self.controls.read().fees.effective_bps(asset)
    }

    /// Fee and net amount for a payment, without moving funds
    pub fn quote(&self, asset: AssetId, amount: Amount) -> Result<FeeQuote, EngineError> {
        self.controls.read().fees.quote(asset, amount)
    }

    /// Every asset ever listed, with its current flag
    pub fn supported_assets(&self) -> Vec<AssetListing> {
        self.controls.read().assets.listings()
    }

    pub fn is_supported(&self, asset: AssetId) -> bool {
        self.controls.read().assets.is_supported(asset)
    }

    pub fn state(&self) -> EngineState {
        self.controls.read().state
    }

    pub fn owner(&self) -> AccountId {
        self.controls.read().owner
    }

    /// The engine's custody account
    pub fn account(&self) -> AccountId {
        self.config.engine_account
    }

    pub fn native_asset_enabled(&self) -> bool {
        self.config.native_asset_enabled
    }

    /// Subscribe to every event on the engine's bus
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    /// Subscribe to events involving `account`
    pub fn subscribe_account(&self, account: AccountId) -> Subscription {
        self.events.subscribe_account(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::core::ledger::InMemoryLedger;
    use crate::core::registry::IdentityRegistry;
    use rstest::rstest;

    const OWNER: u64 = 0x0a;
    const FEES: u64 = 0xfe;
    const ALICE: u64 = 1;
    const BOB: u64 = 2;

    fn acct(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    fn usdc() -> AssetId {
        AssetId::token(acct(0xc0))
    }

    struct Fixture {
        engine: SettlementEngine,
        ledger: Arc<InMemoryLedger>,
    }

    fn fixture_with(config: EngineConfig) -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let events = EventBus::default();
        let guard = Arc::new(ReentrancyGuard::new());
        let registry = Arc::new(
            IdentityRegistry::new(
                acct(OWNER),
                RegistryConfig::default(),
                ledger.clone(),
                events.clone(),
                guard.clone(),
            )
            .unwrap(),
        );
        registry.register_username("alice", acct(ALICE), acct(ALICE)).unwrap();
        registry.register_username("bob", acct(BOB), acct(BOB)).unwrap();

        let engine = SettlementEngine::new(
            acct(OWNER),
            acct(FEES),
            config,
            ledger.clone(),
            registry,
            events,
            guard,
        )
        .unwrap();
        engine.add_supported_asset(acct(OWNER), usdc()).unwrap();
        engine.add_supported_asset(acct(OWNER), AssetId::NATIVE).unwrap();
        ledger.mint(usdc(), acct(ALICE), 1_000_000_000).unwrap();
        ledger.mint(AssetId::NATIVE, acct(ALICE), 1_000_000).unwrap();

        Fixture { engine, ledger }
    }

    fn fixture() -> Fixture {
        fixture_with(EngineConfig::default())
    }

    #[test]
    fn test_send_payment_splits_fee() {
        let Fixture { engine, ledger } = fixture();

        let settlement = engine
            .send_payment(acct(ALICE), "Bob", usdc(), 100_000_000)
            .unwrap();

        assert_eq!(settlement.fee, 500_000);
        assert_eq!(settlement.net_amount, 99_500_000);
        assert_eq!(settlement.record.from_username, "alice");
        assert_eq!(settlement.record.to_username, "bob");
        assert_eq!(ledger.balance_of(usdc(), acct(BOB)), 99_500_000);
        assert_eq!(ledger.balance_of(usdc(), acct(FEES)), 500_000);
        assert_eq!(ledger.balance_of(usdc(), acct(ALICE)), 900_000_000);
        assert_eq!(ledger.balance_of(usdc(), engine.account()), 0);
    }

    #[test]
    fn test_zero_fee_skips_fee_leg() {
        let Fixture { engine, ledger } = fixture();
        engine.set_global_fee_bps(acct(OWNER), 0).unwrap();

        let settlement = engine.send_payment(acct(ALICE), "bob", usdc(), 150).unwrap();

        assert_eq!(settlement.fee, 0);
        assert_eq!(ledger.balance_of(usdc(), acct(BOB)), 150);
        assert_eq!(ledger.balance_of(usdc(), acct(FEES)), 0);
    }

    #[test]
    fn test_to_address_labels_unregistered_payee_empty() {
        let Fixture { engine, ledger } = fixture();

        let settlement = engine
            .send_payment_to_address(acct(ALICE), acct(7), usdc(), 10_000)
            .unwrap();

        assert_eq!(settlement.record.from_username, "alice");
        assert_eq!(settlement.record.to_username, "");
        assert_eq!(ledger.balance_of(usdc(), acct(7)), 9_950);
    }

    #[rstest]
    #[case::unsupported_asset(AssetId::token(acct(0xdd)), "bob", 100, "ASSET_NOT_SUPPORTED")]
    #[case::zero_amount(usdc(), "bob", 0, "ZERO_AMOUNT")]
    #[case::unknown_recipient(usdc(), "carol", 100, "RECIPIENT_NOT_FOUND")]
    #[case::self_payment(usdc(), "ALICE", 100, "SELF_PAYMENT_DISALLOWED")]
    fn test_payment_preconditions(
        #[case] asset: AssetId,
        #[case] to: &str,
        #[case] amount: Amount,
        #[case] code: &str,
    ) {
        let Fixture { engine, ledger } = fixture();
        let before = ledger.balances();

        let error = engine.send_payment(acct(ALICE), to, asset, amount).unwrap_err();

        assert_eq!(error.code(), code);
        assert_eq!(ledger.balances(), before);
    }

    #[test]
    fn test_precondition_order_asset_before_amount() {
        let Fixture { engine, .. } = fixture();
        engine.pause(acct(OWNER)).unwrap();

        // Every precondition fails; the first in order wins
        let error = engine
            .send_payment(acct(ALICE), "nobody", AssetId::token(acct(0xdd)), 0)
            .unwrap_err();
        assert_eq!(error.code(), "ASSET_NOT_SUPPORTED");

        let error = engine.send_payment(acct(ALICE), "nobody", usdc(), 0).unwrap_err();
        assert_eq!(error, EngineError::ZeroAmount);
    }

    #[rstest]
    #[case::zero_account(AccountId::ZERO)]
    #[case::engine_account(crate::config::DEFAULT_ENGINE_ACCOUNT)]
    #[case::registry_account(crate::config::DEFAULT_REGISTRY_ACCOUNT)]
    fn test_reserved_payee_not_found(#[case] to: AccountId) {
        let Fixture { engine, ledger } = fixture();
        assert!(matches!(
            engine.send_payment_to_address(acct(ALICE), to, usdc(), 100),
            Err(EngineError::RecipientNotFound { .. })
        ));
        assert!(matches!(
            engine.send_native_payment_to_address(acct(ALICE), to, 100),
            Err(EngineError::RecipientNotFound { .. })
        ));
        assert_eq!(ledger.balance_of(AssetId::NATIVE, to), 0);
        assert_eq!(ledger.balance_of(usdc(), to), 0);
    }

    #[test]
    fn test_pause_is_idempotent_and_fails_closed() {
        let Fixture { engine, ledger } = fixture();
        engine.pause(acct(OWNER)).unwrap();
        engine.pause(acct(OWNER)).unwrap();
        assert_eq!(engine.state(), EngineState::Paused);

        assert_eq!(
            engine.send_payment(acct(ALICE), "bob", usdc(), 100),
            Err(EngineError::EnginePaused)
        );
        assert_eq!(
            engine.send_native_payment(acct(ALICE), "bob", 100),
            Err(EngineError::EnginePaused)
        );
        assert_eq!(ledger.balance_of(usdc(), acct(BOB)), 0);

        engine.unpause(acct(OWNER)).unwrap();
        assert!(engine.send_payment(acct(ALICE), "bob", usdc(), 100).is_ok());
    }

    #[test]
    fn test_insufficient_balance_moves_nothing() {
        let Fixture { engine, ledger } = fixture();
        let before = ledger.balances();

        let result = engine.send_payment(acct(BOB), "alice", usdc(), 1);

        assert!(matches!(result, Err(EngineError::TransferFailed { .. })));
        assert_eq!(ledger.balances(), before);
    }

    #[test]
    fn test_native_payment() {
        let Fixture { engine, ledger } = fixture();

        let settlement = engine.send_native_payment(acct(ALICE), "bob", 10_000).unwrap();

        assert_eq!(settlement.record.asset, AssetId::NATIVE);
        assert_eq!(ledger.balance_of(AssetId::NATIVE, acct(BOB)), 9_950);
        assert_eq!(ledger.balance_of(AssetId::NATIVE, acct(FEES)), 50);
    }

    #[test]
    fn test_native_disabled() {
        let config = EngineConfig {
            native_asset_enabled: false,
            ..EngineConfig::default()
        };
        let Fixture { engine, .. } = fixture_with(config);

        assert_eq!(
            engine.send_native_payment(acct(ALICE), "bob", 100),
            Err(EngineError::AssetNotSupported {
                asset: AssetId::NATIVE
            })
        );
        assert!(engine
            .pay(acct(ALICE), &Recipient::Account(acct(BOB)), AssetId::NATIVE, 100)
            .is_err());
    }

    #[test]
    fn test_override_applies_per_asset() {
        let Fixture { engine, ledger } = fixture();
        engine.set_asset_fee_override(acct(OWNER), usdc(), 100).unwrap();

        assert_eq!(engine.effective_fee_bps(usdc()), 100);
        assert_eq!(engine.effective_fee_bps(AssetId::NATIVE), 50);

        engine.send_payment(acct(ALICE), "bob", usdc(), 10_000).unwrap();
        assert_eq!(ledger.balance_of(usdc(), acct(FEES)), 100);
    }

    #[test]
    fn test_fee_above_cap_rejected() {
        let Fixture { engine, .. } = fixture();

        assert_eq!(
            engine.set_global_fee_bps(acct(OWNER), 201),
            Err(EngineError::FeeExceedsCap { bps: 201, cap: 200 })
        );
        assert!(engine.set_asset_fee_override(acct(OWNER), usdc(), 201).is_err());
        assert_eq!(engine.fee_schedule().global_bps(), 50);
        assert!(engine.fee_schedule().overrides().is_empty());
    }

    #[test]
    fn test_admin_requires_owner() {
        let Fixture { engine, .. } = fixture();
        let stranger = acct(ALICE);

        assert!(matches!(engine.pause(stranger), Err(EngineError::Unauthorized { .. })));
        assert!(engine.set_global_fee_bps(stranger, 10).is_err());
        assert!(engine.set_fee_recipient(stranger, stranger).is_err());
        assert!(engine.remove_supported_asset(stranger, usdc()).is_err());
        assert!(engine.transfer_ownership(stranger, stranger).is_err());
        assert_eq!(engine.state(), EngineState::Active);
        assert!(engine.is_supported(usdc()));
    }

    #[test]
    fn test_remove_asset_keeps_history() {
        let Fixture { engine, .. } = fixture();

        assert!(engine.remove_supported_asset(acct(OWNER), usdc()).unwrap());
        assert!(!engine.remove_supported_asset(acct(OWNER), usdc()).unwrap());

        let listings = engine.supported_assets();
        assert_eq!(listings.len(), 2);
        assert!(listings.contains(&AssetListing {
            asset: usdc(),
            supported: false
        }));
    }

    #[test]
    fn test_fee_recipient_change() {
        let Fixture { engine, ledger } = fixture();
        assert!(engine.set_fee_recipient(acct(OWNER), AccountId::ZERO).is_err());

        engine.set_fee_recipient(acct(OWNER), acct(0xff)).unwrap();
        engine.send_payment(acct(ALICE), "bob", usdc(), 10_000).unwrap();
        assert_eq!(ledger.balance_of(usdc(), acct(0xff)), 50);
        assert_eq!(ledger.balance_of(usdc(), acct(FEES)), 0);
    }

    #[test]
    fn test_custody_account_cannot_collect_fees() {
        let Fixture { engine, ledger } = fixture();

        assert!(matches!(
            engine.set_fee_recipient(acct(OWNER), engine.account()),
            Err(EngineError::InvalidAccount { .. })
        ));
        assert_eq!(engine.fee_schedule().recipient(), acct(FEES));

        engine.send_payment(acct(ALICE), "bob", usdc(), 10_000).unwrap();
        assert_eq!(ledger.balance_of(usdc(), acct(FEES)), 50);
        assert_eq!(ledger.balance_of(usdc(), engine.account()), 0);
    }

    #[test]
    fn test_custody_account_rejected_as_initial_fee_recipient() {
        let ledger = Arc::new(InMemoryLedger::new());
        let events = EventBus::default();
        let guard = Arc::new(ReentrancyGuard::new());
        let registry = Arc::new(
            IdentityRegistry::new(
                acct(OWNER),
                RegistryConfig::default(),
                ledger.clone(),
                events.clone(),
                guard.clone(),
            )
            .unwrap(),
        );
        let config = EngineConfig::default();

        let result = SettlementEngine::new(
            acct(OWNER),
            config.engine_account,
            config,
            ledger,
            registry,
            events,
            guard,
        );

        assert!(matches!(result, Err(EngineError::InvalidAccount { .. })));
    }

    #[test]
    fn test_settlement_event_published() {
        let Fixture { engine, .. } = fixture();
        let mut bob = engine.subscribe_account(acct(BOB));

        let settlement = engine.send_payment(acct(ALICE), "bob", usdc(), 10_000).unwrap();

        assert_eq!(bob.try_next(), Some(EngineEvent::Settlement(settlement.record)));
        assert_eq!(bob.try_next(), None);
    }

    #[test]
    fn test_quote_matches_settlement() {
        let Fixture { engine, .. } = fixture();
        let quote = engine.quote(usdc(), 123_456_789).unwrap();
        let settlement = engine.send_payment(acct(ALICE), "bob", usdc(), 123_456_789).unwrap();

        assert_eq!(quote.fee, settlement.fee);
        assert_eq!(quote.net_amount, settlement.net_amount);
    }
}
