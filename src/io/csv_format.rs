//! CSV format handling for operation scripts and balance output
//!
//! This module centralizes all CSV format concerns, providing:
//! - ScriptRecord structure for deserialization
//! - Conversion from script records to [`Operation`]s
//! - Human-unit amount scaling and formatting
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Script Format
//!
//! Columns are `op,caller,target,asset,amount`. Unused columns are left empty.
//!
//! | op                     | target         | asset  | amount            |
//! |------------------------|----------------|--------|-------------------|
//! | `mint`                 |                | asset  | human units       |
//! | `register`             | username       |        |                   |
//! | `register_premium`     | username       |        |                   |
//! | `update_username`      | new username   |        |                   |
//! | `transfer_username`    | account        |        |                   |
//! | `pay`                  | @name/account  | asset  | human units       |
//! | `pay_native`           | @name/account  |        | human units       |
//! | `set_fee`              |                |        | bps               |
//! | `set_asset_fee`        |                | asset  | bps               |
//! | `set_fee_recipient`    | account        |        |                   |
//! | `add_asset`            |                | asset  |                   |
//! | `remove_asset`         |                | asset  |                   |
//! | `pause` / `unpause`    |                |        |                   |
//! | `set_registration_fee` |                |        | human units       |
//! | `set_premium_fee`      |                |        | human units       |
//! | `withdraw_fees`        | account        |        |                   |
//! | `transfer_ownership`   | account        |        |                   |

use crate::types::{AccountId, Amount, AssetId, EngineError, Recipient};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Largest supported number of decimal places for human-unit amounts
pub const MAX_DECIMALS: u32 = 18;

/// CSV record structure for deserialization
///
/// Only `op` and `caller` are required on every row.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ScriptRecord {
    pub op: String,
    pub caller: String,
    pub target: Option<String>,
    pub asset: Option<String>,
    pub amount: Option<String>,
}

/// One scripted call against the registry, the engine or the host ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Host-level funding of an account
    Mint {
        account: AccountId,
        asset: AssetId,
        amount: Amount,
    },
    Register {
        owner: AccountId,
        username: String,
        premium: bool,
    },
    UpdateUsername {
        owner: AccountId,
        username: String,
    },
    TransferUsername {
        owner: AccountId,
        recipient: AccountId,
    },
    Pay {
        from: AccountId,
        to: Recipient,
        asset: AssetId,
        amount: Amount,
    },
    SetGlobalFee {
        caller: AccountId,
        bps: u32,
    },
    SetAssetFee {
        caller: AccountId,
        asset: AssetId,
        bps: u32,
    },
    SetFeeRecipient {
        caller: AccountId,
        recipient: AccountId,
    },
    SetAssetSupport {
        caller: AccountId,
        asset: AssetId,
        supported: bool,
    },
    SetPaused {
        caller: AccountId,
        paused: bool,
    },
    SetRegistrationFee {
        caller: AccountId,
        fee: Amount,
        premium: bool,
    },
    WithdrawFees {
        caller: AccountId,
        to: AccountId,
    },
    TransferOwnership {
        caller: AccountId,
        new_owner: AccountId,
    },
}

/// Convert a ScriptRecord to an Operation
///
/// # Arguments
///
/// * `record` - The deserialized script row
/// * `decimals` - Decimal places of one whole token; human-unit amounts are
///   multiplied by `10^decimals`
///
/// # Errors
///
/// Returns `ParseError` (without a line number) if the op is unknown, a
/// required column is missing, or a column does not parse.
pub fn convert_script_record(record: ScriptRecord, decimals: u32) -> Result<Operation, EngineError> {
    let op = record.op.trim().to_lowercase();
    let caller = parse_account("caller", Some(&record.caller))?;

    let operation = match op.as_str() {
        "mint" => Operation::Mint {
            account: caller,
            asset: parse_asset(record.asset.as_deref())?,
            amount: parse_amount(record.amount.as_deref(), decimals)?,
        },
        "register" | "register_premium" => Operation::Register {
            owner: caller,
            username: required("target", record.target.as_deref())?.to_string(),
            premium: op == "register_premium",
        },
        "update_username" => Operation::UpdateUsername {
            owner: caller,
            username: required("target", record.target.as_deref())?.to_string(),
        },
        "transfer_username" => Operation::TransferUsername {
            owner: caller,
            recipient: parse_account("target", record.target.as_deref())?,
        },
        "pay" => Operation::Pay {
            from: caller,
            to: parse_recipient(record.target.as_deref())?,
            asset: parse_asset(record.asset.as_deref())?,
            amount: parse_amount(record.amount.as_deref(), decimals)?,
        },
        "pay_native" => Operation::Pay {
            from: caller,
            to: parse_recipient(record.target.as_deref())?,
            asset: AssetId::NATIVE,
            amount: parse_amount(record.amount.as_deref(), decimals)?,
        },
        "set_fee" => Operation::SetGlobalFee {
            caller,
            bps: parse_bps(record.amount.as_deref())?,
        },
        "set_asset_fee" => Operation::SetAssetFee {
            caller,
            asset: parse_asset(record.asset.as_deref())?,
            bps: parse_bps(record.amount.as_deref())?,
        },
        "set_fee_recipient" => Operation::SetFeeRecipient {
            caller,
            recipient: parse_account("target", record.target.as_deref())?,
        },
        "add_asset" | "remove_asset" => Operation::SetAssetSupport {
            caller,
            asset: parse_asset(record.asset.as_deref())?,
            supported: op == "add_asset",
        },
        "pause" | "unpause" => Operation::SetPaused {
            caller,
            paused: op == "pause",
        },
        "set_registration_fee" | "set_premium_fee" => Operation::SetRegistrationFee {
            caller,
            fee: parse_amount(record.amount.as_deref(), decimals)?,
            premium: op == "set_premium_fee",
        },
        "withdraw_fees" => Operation::WithdrawFees {
            caller,
            to: parse_account("target", record.target.as_deref())?,
        },
        "transfer_ownership" => Operation::TransferOwnership {
            caller,
            new_owner: parse_account("target", record.target.as_deref())?,
        },
        _ => return Err(parse_error(format!("Invalid operation '{}'", record.op))),
    };

    Ok(operation)
}

/// Scale a human-unit amount such as `100.5` to base units
///
/// # Errors
///
/// Returns `ParseError` if the amount is not a non-negative decimal, has more
/// fractional digits than `decimals`, or does not fit in an [`Amount`].
pub fn scale_amount(raw: &str, decimals: u32) -> Result<Amount, EngineError> {
    if decimals > MAX_DECIMALS {
        return Err(parse_error(format!(
            "At most {} decimals are supported, got {}",
            MAX_DECIMALS, decimals
        )));
    }
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| parse_error(format!("Invalid amount '{}'", raw)))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(parse_error(format!("Negative amount '{}'", raw)));
    }

    let scaled = value
        .checked_mul(Decimal::from(10u64.pow(decimals)))
        .ok_or_else(|| parse_error(format!("Amount '{}' is too large", raw)))?;
    if !scaled.fract().is_zero() {
        return Err(parse_error(format!(
            "Amount '{}' has more than {} decimal places",
            raw, decimals
        )));
    }

    scaled
        .to_u128()
        .ok_or_else(|| parse_error(format!("Amount '{}' is too large", raw)))
}

/// Render base units as a human-unit decimal with exactly `decimals` places
pub fn format_amount(amount: Amount, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let unit = 10u128.pow(decimals);
    format!(
        "{}.{:0width$}",
        amount / unit,
        amount % unit,
        width = decimals as usize
    )
}

/// Write balances to CSV format
///
/// Writes rows with columns: account, asset, balance. Rows are sorted by
/// account, then asset, for deterministic output.
///
/// # Arguments
///
/// * `balances` - `(account, asset, base units)` rows
/// * `decimals` - Decimal places used to render balances
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Errors
///
/// Returns `IoError` if writing to `output` fails.
pub fn write_balances_csv(
    balances: &[(AccountId, AssetId, Amount)],
    decimals: u32,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["account", "asset", "balance"])?;

    let mut sorted = balances.to_vec();
    sorted.sort();

    for (account, asset, amount) in sorted {
        writer.write_record(&[
            account.to_string(),
            asset.to_string(),
            format_amount(amount, decimals),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_error(message: String) -> EngineError {
    EngineError::ParseError {
        line: None,
        message,
    }
}

fn required<'a>(column: &str, value: Option<&'a str>) -> Result<&'a str, EngineError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(parse_error(format!("Missing {}", column))),
    }
}

fn parse_account(column: &str, value: Option<&str>) -> Result<AccountId, EngineError> {
    let value = required(column, value)?;
    AccountId::from_str(value)
        .map_err(|_| parse_error(format!("Invalid {} account '{}'", column, value)))
}

fn parse_asset(value: Option<&str>) -> Result<AssetId, EngineError> {
    let value = required("asset", value)?;
    AssetId::from_str(value).map_err(|_| parse_error(format!("Invalid asset '{}'", value)))
}

fn parse_recipient(value: Option<&str>) -> Result<Recipient, EngineError> {
    let value = required("target", value)?;
    Recipient::from_str(value).map_err(|_| parse_error(format!("Invalid recipient '{}'", value)))
}

fn parse_amount(value: Option<&str>, decimals: u32) -> Result<Amount, EngineError> {
    scale_amount(required("amount", value)?, decimals)
}

fn parse_bps(value: Option<&str>) -> Result<u32, EngineError> {
    let value = required("amount", value)?;
    value
        .parse::<u32>()
        .map_err(|_| parse_error(format!("Invalid basis points '{}'", value)))
}
