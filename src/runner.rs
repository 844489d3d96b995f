//! Script runner
//!
//! Drives an [`IdentityRegistry`] and a [`SettlementEngine`] sharing one
//! [`InMemoryLedger`] from a CSV operation script.
//!
//! # Design
//!
//! The runner focuses on orchestration, delegating:
//! - Script parsing to `ScriptReader` (iterator interface)
//! - Business rules to the registry and the engine
//! - Balance output to `csv_format::write_balances_csv`
//!
//! Operations are applied strictly one after another. A rejected or malformed
//! row is logged and skipped; only fatal I/O errors stop the run.

use crate::config::{EngineConfig, RegistryConfig};
use crate::core::{
    EventBus, IdentityRegistry, InMemoryLedger, ReentrancyGuard, SettlementEngine, Subscription,
};
use crate::io::{write_balances_csv, Operation, ScriptReader};
use crate::types::{AccountId, AssetId, EngineError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default owner of both components in scripted runs
pub const DEFAULT_OWNER: AccountId = AccountId::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0a,
]);

/// Default fee recipient in scripted runs
pub const DEFAULT_FEE_RECIPIENT: AccountId = AccountId::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xfe,
]);

/// Default decimal places of one whole token
pub const DEFAULT_DECIMALS: u32 = 6;

/// Everything needed to stand up a registry and an engine for a run
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Owner of both the registry and the engine
    pub owner: AccountId,
    pub fee_recipient: AccountId,
    pub engine: EngineConfig,
    pub registry: RegistryConfig,
    /// Decimal places used for every asset's human units
    pub decimals: u32,
    /// Assets put on the allowlist before the script runs
    pub assets: Vec<AssetId>,
    /// Where to append events as JSON lines
    pub events_path: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER,
            fee_recipient: DEFAULT_FEE_RECIPIENT,
            engine: EngineConfig::default(),
            registry: RegistryConfig::default(),
            decimals: DEFAULT_DECIMALS,
            assets: Vec::new(),
            events_path: None,
        }
    }
}

/// Outcome counts for one script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

/// Applies scripted operations to a registry and engine
pub struct ScriptRunner {
    ledger: Arc<InMemoryLedger>,
    registry: Arc<IdentityRegistry>,
    engine: SettlementEngine,
    decimals: u32,
    events_path: Option<PathBuf>,
}

impl ScriptRunner {
    /// Build the ledger, registry and engine described by `settings`
    ///
    /// Every asset in `settings.assets` is allowlisted, plus the native asset
    /// when the native capability is enabled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `InvalidAccount` if the settings are
    /// inconsistent.
    pub fn new(settings: RunnerSettings) -> Result<Self, EngineError> {
        let ledger = Arc::new(InMemoryLedger::new());
        let events = EventBus::new(settings.engine.event_capacity);
        let guard = Arc::new(ReentrancyGuard::new());
        let registry = Arc::new(IdentityRegistry::new(
            settings.owner,
            settings.registry,
            ledger.clone(),
            events.clone(),
            guard.clone(),
        )?);
        let native_enabled = settings.engine.native_asset_enabled;
        let engine = SettlementEngine::new(
            settings.owner,
            settings.fee_recipient,
            settings.engine,
            ledger.clone(),
            registry.clone(),
            events,
            guard,
        )?;

        let native = native_enabled.then_some(AssetId::NATIVE);
        for asset in settings.assets.into_iter().chain(native) {
            engine.add_supported_asset(settings.owner, asset)?;
        }

        Ok(Self {
            ledger,
            registry,
            engine,
            decimals: settings.decimals,
            events_path: settings.events_path,
        })
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &SettlementEngine {
        &self.engine
    }

    /// Apply a single operation
    pub fn apply(&self, operation: Operation) -> Result<(), EngineError> {
        match operation {
            Operation::Mint {
                account,
                asset,
                amount,
            } => self
                .ledger
                .mint(asset, account, amount)
                .map_err(|source| EngineError::transfer_failed("mint", source)),
            Operation::Register {
                owner,
                username,
                premium: false,
            } => self
                .registry
                .register_username(&username, owner, owner)
                .map(|_| ()),
            Operation::Register {
                owner,
                username,
                premium: true,
            } => self
                .registry
                .register_premium_username(&username, owner, owner)
                .map(|_| ()),
            Operation::UpdateUsername { owner, username } => {
                self.registry.update_username(owner, &username).map(|_| ())
            }
            Operation::TransferUsername { owner, recipient } => {
                self.registry.transfer_username(owner, recipient).map(|_| ())
            }
            Operation::Pay {
                from,
                to,
                asset,
                amount,
            } => self.engine.pay(from, &to, asset, amount).map(|_| ()),
            Operation::SetGlobalFee { caller, bps } => self.engine.set_global_fee_bps(caller, bps),
            Operation::SetAssetFee { caller, asset, bps } => {
                self.engine.set_asset_fee_override(caller, asset, bps)
            }
            Operation::SetFeeRecipient { caller, recipient } => {
                self.engine.set_fee_recipient(caller, recipient)
            }
            Operation::SetAssetSupport {
                caller,
                asset,
                supported: true,
            } => self.engine.add_supported_asset(caller, asset).map(|_| ()),
            Operation::SetAssetSupport {
                caller,
                asset,
                supported: false,
            } => self.engine.remove_supported_asset(caller, asset).map(|_| ()),
            Operation::SetPaused {
                caller,
                paused: true,
            } => self.engine.pause(caller),
            Operation::SetPaused {
                caller,
                paused: false,
            } => self.engine.unpause(caller),
            Operation::SetRegistrationFee {
                caller,
                fee,
                premium: false,
            } => self.registry.set_registration_fee(caller, fee),
            Operation::SetRegistrationFee {
                caller,
                fee,
                premium: true,
            } => self.registry.set_premium_fee(caller, fee),
            Operation::WithdrawFees { caller, to } => {
                self.registry.withdraw_fees(caller, to).map(|_| ())
            }
            Operation::TransferOwnership { caller, new_owner } => {
                self.transfer_ownership(caller, new_owner)
            }
        }
    }

    /// Hand over every component `caller` owns
    fn transfer_ownership(&self, caller: AccountId, new_owner: AccountId) -> Result<(), EngineError> {
        let owns_engine = self.engine.owner() == caller;
        let owns_registry = self.registry.owner() == caller;
        if !owns_engine && !owns_registry {
            return Err(EngineError::unauthorized(caller, "transfer_ownership"));
        }
        if owns_engine {
            self.engine.transfer_ownership(caller, new_owner)?;
        }
        if owns_registry {
            self.registry.transfer_ownership(caller, new_owner)?;
        }
        Ok(())
    }

    /// Run a script and write final balances to `output`
    ///
    /// # Arguments
    ///
    /// * `script` - Path to the CSV script
    /// * `output` - Writer receiving `account,asset,balance` rows
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions: the script cannot be
    /// opened, or the event log or output cannot be written. Rejected and
    /// malformed rows are logged and counted in the summary.
    pub fn run(&self, script: &Path, output: &mut dyn Write) -> Result<RunSummary, EngineError> {
        let reader = ScriptReader::new(script, self.decimals)?;
        let mut event_log = self.open_event_log()?;
        let mut summary = RunSummary::default();

        for (index, result) in reader.enumerate() {
            // Header is line 1
            let line = index + 2;
            match result {
                Ok(operation) => match self.apply(operation) {
                    Ok(()) => summary.applied += 1,
                    Err(e) => {
                        summary.rejected += 1;
                        tracing::warn!(line, code = e.code(), error = %e, "Operation rejected");
                    }
                },
                Err(e) => {
                    summary.malformed += 1;
                    tracing::warn!(line, error = %e, "Malformed script row");
                }
            }

            if let Some((subscription, writer)) = event_log.as_mut() {
                write_events(subscription, writer)?;
            }
        }

        if let Some((_, mut writer)) = event_log {
            writer.flush()?;
        }

        tracing::info!(
            applied = summary.applied,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Script complete"
        );

        write_balances_csv(&self.ledger.balances(), self.decimals, output)?;
        Ok(summary)
    }

    fn open_event_log(&self) -> Result<Option<(Subscription, BufWriter<File>)>, EngineError> {
        let Some(path) = &self.events_path else {
            return Ok(None);
        };
        let file = File::create(path)?;
        Ok(Some((self.engine.subscribe(), BufWriter::new(file))))
    }
}

/// Append every buffered event as one JSON object per line
fn write_events(subscription: &mut Subscription, writer: &mut impl Write) -> Result<(), EngineError> {
    for event in subscription.drain() {
        serde_json::to_writer(&mut *writer, &event).map_err(|e| EngineError::IoError {
            message: e.to_string(),
        })?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineEvent;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ALICE: &str = "0x0000000000000000000000000000000000000001";
    const BOB: &str = "0x0000000000000000000000000000000000000002";
    const OWNER: &str = "0x000000000000000000000000000000000000000a";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn script(rows: &[String]) -> NamedTempFile {
        let mut content = String::from("op,caller,target,asset,amount\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        create_temp_csv(&content)
    }

    #[test]
    fn test_runner_seeds_native_asset() {
        let runner = ScriptRunner::new(RunnerSettings::default()).unwrap();
        assert!(runner.engine().is_supported(AssetId::NATIVE));

        let settings = RunnerSettings {
            engine: EngineConfig {
                native_asset_enabled: false,
                ..EngineConfig::default()
            },
            ..RunnerSettings::default()
        };
        let runner = ScriptRunner::new(settings).unwrap();
        assert!(!runner.engine().is_supported(AssetId::NATIVE));
    }

    #[test]
    fn test_runner_settles_native_payment() {
        let file = script(&[
            format!("mint,{ALICE},,native,100"),
            format!("register,{BOB},Bob,,"),
            format!("pay_native,{ALICE},@BOB,,100"),
        ]);
        let runner = ScriptRunner::new(RunnerSettings::default()).unwrap();
        let mut output = Vec::new();

        let summary = runner.run(file.path(), &mut output).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                applied: 3,
                rejected: 0,
                malformed: 0
            }
        );
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains(&format!("{BOB},native,99.500000")));
        assert!(output.contains("0x00000000000000000000000000000000000000fe,native,0.500000"));
    }

    #[test]
    fn test_runner_skips_rejected_and_malformed_rows() {
        let file = script(&[
            format!("mint,{ALICE},,native,10"),
            format!("pay_native,{ALICE},nobody,,1"),
            format!("pay_native,{ALICE},,,1"),
            format!("pause,{ALICE},,,"),
        ]);
        let runner = ScriptRunner::new(RunnerSettings::default()).unwrap();
        let mut output = Vec::new();

        let summary = runner.run(file.path(), &mut output).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_runner_transfers_both_ownerships() {
        let runner = ScriptRunner::new(RunnerSettings::default()).unwrap();
        let new_owner = AccountId::from_low_u64(0x0b);

        runner
            .apply(Operation::TransferOwnership {
                caller: DEFAULT_OWNER,
                new_owner,
            })
            .unwrap();

        assert_eq!(runner.engine().owner(), new_owner);
        assert_eq!(runner.registry().owner(), new_owner);
        assert!(runner
            .apply(Operation::TransferOwnership {
                caller: DEFAULT_OWNER,
                new_owner,
            })
            .is_err());
    }

    #[test]
    fn test_runner_writes_event_log() {
        let events = NamedTempFile::new().unwrap();
        let file = script(&[format!("pause,{OWNER},,,"), format!("unpause,{OWNER},,,")]);
        let settings = RunnerSettings {
            events_path: Some(events.path().to_path_buf()),
            ..RunnerSettings::default()
        };
        let runner = ScriptRunner::new(settings).unwrap();

        runner.run(file.path(), &mut Vec::new()).unwrap();

        let log = std::fs::read_to_string(events.path()).unwrap();
        let parsed: Vec<EngineEvent> = log
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            parsed,
            vec![
                EngineEvent::Paused { by: DEFAULT_OWNER },
                EngineEvent::Unpaused { by: DEFAULT_OWNER },
            ]
        );
    }

    #[test]
    fn test_runner_missing_script_is_fatal() {
        let runner = ScriptRunner::new(RunnerSettings::default()).unwrap();
        let result = runner.run(Path::new("nonexistent.csv"), &mut Vec::new());
        assert!(matches!(result, Err(EngineError::FileNotFound { .. })));
    }
}
