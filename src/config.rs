//! Engine and registry configuration
//!
//! Capability flags and initial values that fix how a deployment behaves. The
//! fee cap in particular is immutable once an engine is built from a config.

use crate::core::events::DEFAULT_EVENT_CAPACITY;
use crate::core::fees::BPS_DENOMINATOR;
use crate::types::{AccountId, Amount, AssetId, EngineError};

/// Default fee cap in basis points (2%)
pub const DEFAULT_FEE_CAP_BPS: u32 = 200;

/// Default global fee in basis points (0.5%)
pub const DEFAULT_FEE_BPS: u32 = 50;

/// Default custody account of the settlement engine
pub const DEFAULT_ENGINE_ACCOUNT: AccountId = AccountId::new([
    0x5e, 0x77, 0x1e, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01,
]);

/// Default custody account of the identity registry
pub const DEFAULT_REGISTRY_ACCOUNT: AccountId = AccountId::new([
    0x12, 0xe6, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x02,
]);

/// Settlement engine configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Immutable upper bound for the global fee and every override
    pub fee_cap_bps: u32,
    /// Global fee the engine starts with
    pub initial_fee_bps: u32,
    /// Whether the native asset can be settled at all
    pub native_asset_enabled: bool,
    /// The engine's own custody account
    pub engine_account: AccountId,
    /// Events buffered per subscriber
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_cap_bps: DEFAULT_FEE_CAP_BPS,
            initial_fee_bps: DEFAULT_FEE_BPS,
            native_asset_enabled: true,
            engine_account: DEFAULT_ENGINE_ACCOUNT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Create a validated config with the default custody account
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the cap is not below 10_000 bps or the initial
    /// fee is above the cap.
    pub fn new(
        fee_cap_bps: u32,
        initial_fee_bps: u32,
        native_asset_enabled: bool,
    ) -> Result<Self, EngineError> {
        let config = Self {
            fee_cap_bps,
            initial_fee_bps,
            native_asset_enabled,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the fee bounds and custody account
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fee_cap_bps >= BPS_DENOMINATOR {
            return Err(EngineError::invalid_config(format!(
                "fee cap {} bps must be below {} bps",
                self.fee_cap_bps, BPS_DENOMINATOR
            )));
        }
        if self.initial_fee_bps > self.fee_cap_bps {
            return Err(EngineError::invalid_config(format!(
                "initial fee {} bps exceeds cap {} bps",
                self.initial_fee_bps, self.fee_cap_bps
            )));
        }
        if self.engine_account.is_zero() {
            return Err(EngineError::invalid_config(
                "engine account must not be the zero account",
            ));
        }
        Ok(())
    }
}

/// Identity registry configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Fee for a standard registration, in `fee_asset` base units
    pub registration_fee: Amount,
    /// Fee for a premium registration
    pub premium_fee: Amount,
    /// Asset registration fees are paid in
    pub fee_asset: AssetId,
    /// The registry's own account; collected fees accrue here
    pub registry_account: AccountId,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registration_fee: 0,
            premium_fee: 0,
            fee_asset: AssetId::NATIVE,
            registry_account: DEFAULT_REGISTRY_ACCOUNT,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.registry_account.is_zero() {
            return Err(EngineError::invalid_config(
                "registry account must not be the zero account",
            ));
        }
        Ok(())
    }
}
