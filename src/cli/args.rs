use crate::config::{EngineConfig, RegistryConfig, DEFAULT_FEE_BPS, DEFAULT_FEE_CAP_BPS};
use crate::io::csv_format::{scale_amount, MAX_DECIMALS};
use crate::runner::{RunnerSettings, DEFAULT_DECIMALS, DEFAULT_FEE_RECIPIENT, DEFAULT_OWNER};
use crate::types::{AccountId, AssetId, EngineError};
use clap::Parser;
use std::path::PathBuf;

/// Run a payment settlement script against a fresh registry and engine
#[derive(Parser, Debug)]
#[command(name = "settlement-engine")]
#[command(
    about = "Run username registrations and fee-skimming payments from a CSV script",
    long_about = None
)]
pub struct CliArgs {
    /// Script CSV file path
    #[arg(value_name = "SCRIPT", help = "Path to the CSV operation script")]
    pub script: PathBuf,

    /// Owner of the registry and the engine
    #[arg(long = "owner", value_name = "ACCOUNT", default_value_t = DEFAULT_OWNER)]
    pub owner: AccountId,

    /// Account credited with settlement fees
    #[arg(long = "fee-recipient", value_name = "ACCOUNT", default_value_t = DEFAULT_FEE_RECIPIENT)]
    pub fee_recipient: AccountId,

    /// Initial global fee in basis points
    #[arg(long = "fee-bps", value_name = "BPS", default_value_t = DEFAULT_FEE_BPS)]
    pub fee_bps: u32,

    /// Immutable fee cap in basis points
    #[arg(long = "fee-cap-bps", value_name = "BPS", default_value_t = DEFAULT_FEE_CAP_BPS)]
    pub fee_cap_bps: u32,

    /// Disable native asset settlement
    #[arg(long = "no-native")]
    pub no_native: bool,

    /// Standard registration fee, in human units of the native asset
    #[arg(long = "registration-fee", value_name = "AMOUNT")]
    pub registration_fee: Option<String>,

    /// Premium registration fee, in human units of the native asset
    #[arg(long = "premium-fee", value_name = "AMOUNT")]
    pub premium_fee: Option<String>,

    /// Decimal places of one whole token
    #[arg(
        long = "decimals",
        value_name = "N",
        default_value_t = DEFAULT_DECIMALS,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMALS as i64)
    )]
    pub decimals: u32,

    /// Asset to allowlist before the script runs (repeatable)
    #[arg(long = "asset", value_name = "ASSET")]
    pub assets: Vec<AssetId>,

    /// Write every event to this file as JSON lines
    #[arg(long = "events", value_name = "PATH")]
    pub events: Option<PathBuf>,
}

impl CliArgs {
    /// Build runner settings from CLI arguments
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the fee bounds are inconsistent and
    /// `ParseError` if a registration fee is not a valid amount.
    pub fn to_settings(&self) -> Result<RunnerSettings, EngineError> {
        let engine = EngineConfig::new(self.fee_cap_bps, self.fee_bps, !self.no_native)?;

        let fee = |raw: &Option<String>| {
            raw.as_deref()
                .map(|raw| scale_amount(raw, self.decimals))
                .transpose()
                .map(Option::unwrap_or_default)
        };
        let registry = RegistryConfig {
            registration_fee: fee(&self.registration_fee)?,
            premium_fee: fee(&self.premium_fee)?,
            ..RegistryConfig::default()
        };

        Ok(RunnerSettings {
            owner: self.owner,
            fee_recipient: self.fee_recipient,
            engine,
            registry,
            decimals: self.decimals,
            assets: self.assets.clone(),
            events_path: self.events.clone(),
        })
    }
}
