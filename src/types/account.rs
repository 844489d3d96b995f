//! Account and asset identifiers for the settlement engine
//!
//! Accounts and assets share the same 20-byte identifier shape used by the host
//! settlement layer. Both are rendered as `0x`-prefixed lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Asset amounts in base units (e.g. 1 USDC = 1_000_000)
pub type Amount = u128;

/// Length in bytes of an account or asset identifier
pub const ID_LENGTH: usize = 20;

/// Account identifier
///
/// A 20-byte identifier for any party the engine can move value between:
/// users, the fee recipient, and the engine's and registry's own custody accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; ID_LENGTH]);

impl AccountId {
    /// The null account. Never a valid owner, fee recipient or payee.
    pub const ZERO: AccountId = AccountId([0u8; ID_LENGTH]);

    /// Create an account identifier from raw bytes
    pub const fn new(bytes: [u8; ID_LENGTH]) -> Self {
        AccountId(bytes)
    }

    /// Create an account identifier whose low 8 bytes hold `value` (big-endian)
    ///
    /// Handy for deterministic test and fixture accounts.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        bytes[ID_LENGTH - 8..].copy_from_slice(&value.to_be_bytes());
        AccountId(bytes)
    }

    /// Raw bytes of this identifier
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Whether this is the null account
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| format!("Account '{}' must start with 0x", trimmed))?;

        if digits.len() != ID_LENGTH * 2 {
            return Err(format!(
                "Account '{}' must have {} hex digits",
                trimmed,
                ID_LENGTH * 2
            ));
        }

        let mut bytes = [0u8; ID_LENGTH];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| format!("Account '{}' is not valid hex: {}", trimmed, e))?;
        Ok(AccountId(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Asset identifier
///
/// Issued tokens are identified by their contract account. The native currency
/// of the host layer uses the reserved [`AssetId::NATIVE`] sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(AccountId);

impl AssetId {
    /// Reserved identifier for the host layer's native currency
    ///
    /// `0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE`
    pub const NATIVE: AssetId = AssetId(AccountId::new([0xee; ID_LENGTH]));

    /// Create an asset identifier for an issued token
    pub const fn token(contract: AccountId) -> Self {
        AssetId(contract)
    }

    /// Whether this is the native-asset sentinel
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    /// The token contract account behind this asset
    pub fn contract(&self) -> AccountId {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            f.write_str("native")
        } else {
            self.0.fmt(f)
        }
    }
}

impl FromStr for AssetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("native") {
            return Ok(AssetId::NATIVE);
        }
        s.parse().map(AssetId)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Payee of a settlement: a username to resolve, or a direct account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Resolved through the identity registry (case-insensitive)
    Username(String),
    /// Paid directly; the registry is only consulted for record labels
    Account(AccountId),
}

impl FromStr for Recipient {
    type Err = String;

    /// `0x` followed by 40 hex digits is an account; anything else is a
    /// username, with an optional leading `@`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 2 + ID_LENGTH * 2 && trimmed.starts_with("0x") {
            return trimmed.parse().map(Recipient::Account);
        }
        let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
        Ok(Recipient::Username(name.to_string()))
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Username(name) => write!(f, "@{}", name),
            Recipient::Account(account) => account.fmt(f),
        }
    }
}
