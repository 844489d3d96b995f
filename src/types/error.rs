//! Error types for the settlement engine
//!
//! Errors are categorical: each variant names one reason an operation was
//! rejected, and every rejection leaves state exactly as it was before the call.
//!
//! # Error Categories
//!
//! - **Registry Errors**: invalid or taken usernames, ownership conflicts
//! - **Settlement Errors**: unsupported assets, unknown recipients, paused engine
//! - **Admin Errors**: unauthorized callers, fees above the cap
//! - **Host Errors**: failed asset transfers on the underlying ledger
//! - **File I/O Errors**: script and output handling in the CLI runner

use super::account::{AccountId, Amount, AssetId};
use thiserror::Error;

/// Failure reported by the host asset ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The source account does not hold enough of the asset
    #[error("Insufficient {asset} balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    /// Crediting the destination would overflow its balance
    #[error("Balance overflow crediting {asset} to {account}")]
    BalanceOverflow { account: AccountId, asset: AssetId },

    /// The host refused the transfer for its own reasons
    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Main error type for the settlement engine
///
/// Each variant includes enough context to diagnose the failure in logs. Use
/// [`EngineError::user_message`] for text shown to end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Username is empty, too long, or uses characters outside `[0-9A-Za-z_]`
    #[error("Invalid username '{username}'")]
    UsernameInvalid {
        /// The username as supplied
        username: String,
    },

    /// Another account already owns this username (case-insensitive)
    #[error("Username '{username}' is already taken")]
    UsernameTaken {
        /// Normalized username
        username: String,
    },

    /// The would-be owner already holds a username
    #[error("Account {owner} already owns a username")]
    OwnerAlreadyRegistered { owner: AccountId },

    /// Rename requested by an account without a username
    #[error("Account {owner} has no username to update")]
    NoUsernameToUpdate { owner: AccountId },

    /// Transfer requested by an account without a username
    #[error("Account {owner} has no username to transfer")]
    NoUsernameToTransfer { owner: AccountId },

    /// Premium usernames can be transferred but never renamed
    #[error("Premium username '{username}' cannot be renamed")]
    PremiumImmutable { username: String },

    /// Transfer target already holds a username
    #[error("Recipient {recipient} already owns a username")]
    RecipientAlreadyRegistered { recipient: AccountId },

    /// Asset is not on the settlement allowlist
    #[error("Asset {asset} is not supported")]
    AssetNotSupported { asset: AssetId },

    /// Settlement amount must be positive
    #[error("Payment amount must be greater than zero")]
    ZeroAmount,

    /// Recipient username or account does not resolve to a payable account
    #[error("Recipient {recipient} not found")]
    RecipientNotFound { recipient: String },

    /// Payer and resolved payee are the same account
    #[error("Account {account} cannot pay itself")]
    SelfPaymentDisallowed { account: AccountId },

    /// Circuit breaker is engaged; value-moving operations fail closed
    #[error("Settlement engine is paused")]
    EnginePaused,

    /// Fee above the immutable cap
    #[error("Fee of {bps} bps exceeds the cap of {cap} bps")]
    FeeExceedsCap { bps: u32, cap: u32 },

    /// Registry fee balance is empty
    #[error("No registration fees to withdraw")]
    NoFeesToWithdraw,

    /// Caller is not the owner of the component
    #[error("Account {caller} is not authorized for {operation}")]
    Unauthorized { caller: AccountId, operation: String },

    /// Account may not take the given role (zero account, own custody account)
    #[error("Account {account} is not a valid {role}")]
    InvalidAccount { account: AccountId, role: String },

    /// A mutating entry point was entered while another is in flight
    #[error("Re-entrant call into {operation} rejected")]
    ReentrantCall { operation: String },

    /// Host ledger rejected a settlement leg; nothing was moved
    #[error("Asset transfer failed during {operation}: {source}")]
    TransferFailed {
        operation: String,
        #[source]
        source: LedgerError,
    },

    /// Registration fee could not be collected from the payer
    #[error("Registration fee transfer from {payer} failed: {source}")]
    FeeTransferFailed {
        payer: AccountId,
        #[source]
        source: LedgerError,
    },

    /// Arithmetic would overflow
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// Script parsing error
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        EngineError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl EngineError {
    /// Stable machine-readable category code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UsernameInvalid { .. } => "USERNAME_INVALID",
            EngineError::UsernameTaken { .. } => "USERNAME_TAKEN",
            EngineError::OwnerAlreadyRegistered { .. } => "OWNER_ALREADY_REGISTERED",
            EngineError::NoUsernameToUpdate { .. } => "NO_USERNAME_TO_UPDATE",
            EngineError::NoUsernameToTransfer { .. } => "NO_USERNAME_TO_TRANSFER",
            EngineError::PremiumImmutable { .. } => "PREMIUM_IMMUTABLE",
            EngineError::RecipientAlreadyRegistered { .. } => "RECIPIENT_ALREADY_REGISTERED",
            EngineError::AssetNotSupported { .. } => "ASSET_NOT_SUPPORTED",
            EngineError::ZeroAmount => "ZERO_AMOUNT",
            EngineError::RecipientNotFound { .. } => "RECIPIENT_NOT_FOUND",
            EngineError::SelfPaymentDisallowed { .. } => "SELF_PAYMENT_DISALLOWED",
            EngineError::EnginePaused => "ENGINE_PAUSED",
            EngineError::FeeExceedsCap { .. } => "FEE_EXCEEDS_CAP",
            EngineError::NoFeesToWithdraw => "NO_FEES_TO_WITHDRAW",
            EngineError::Unauthorized { .. } => "UNAUTHORIZED",
            EngineError::InvalidAccount { .. } => "INVALID_ACCOUNT",
            EngineError::ReentrantCall { .. } => "REENTRANT_CALL",
            EngineError::TransferFailed { .. } => "TRANSFER_FAILED",
            EngineError::FeeTransferFailed { .. } => "FEE_TRANSFER_FAILED",
            EngineError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            EngineError::InvalidConfig { .. } => "INVALID_CONFIG",
            EngineError::FileNotFound { .. } => "FILE_NOT_FOUND",
            EngineError::IoError { .. } => "IO_ERROR",
            EngineError::ParseError { .. } => "PARSE_ERROR",
        }
    }

    /// Stable message for end users
    ///
    /// Unlike `Display`, this never includes balances, internal accounts or
    /// ledger details.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::UsernameInvalid { .. } => {
                "Usernames must be 1-32 characters using letters, digits or underscores."
            }
            EngineError::UsernameTaken { .. } => "That username is already taken.",
            EngineError::OwnerAlreadyRegistered { .. } => "You already have a username.",
            EngineError::NoUsernameToUpdate { .. } => "You don't have a username to change yet.",
            EngineError::NoUsernameToTransfer { .. } => {
                "You don't have a username to transfer yet."
            }
            EngineError::PremiumImmutable { .. } => {
                "Premium usernames can be transferred but not renamed."
            }
            EngineError::RecipientAlreadyRegistered { .. } => {
                "The recipient already has a username."
            }
            EngineError::AssetNotSupported { .. } => "That asset isn't supported for payments.",
            EngineError::ZeroAmount => "Payment amount must be greater than zero.",
            EngineError::RecipientNotFound { .. } => "We couldn't find that recipient.",
            EngineError::SelfPaymentDisallowed { .. } => "You can't send a payment to yourself.",
            EngineError::EnginePaused => {
                "Payments are temporarily paused. Please try again later."
            }
            EngineError::FeeExceedsCap { .. } => "That fee is above the allowed maximum.",
            EngineError::NoFeesToWithdraw => "There are no fees to withdraw.",
            EngineError::Unauthorized { .. } => "You are not allowed to perform this action.",
            EngineError::InvalidAccount { .. } => "That account can't be used here.",
            EngineError::ReentrantCall { .. } => {
                "Another operation is in progress. Please try again."
            }
            EngineError::TransferFailed { .. } => {
                "The transfer could not be completed. Check your balance and try again."
            }
            EngineError::FeeTransferFailed { .. } => {
                "The registration fee could not be collected. Check your balance and try again."
            }
            EngineError::ArithmeticOverflow { .. } => "That amount is too large.",
            EngineError::InvalidConfig { .. }
            | EngineError::FileNotFound { .. }
            | EngineError::IoError { .. }
            | EngineError::ParseError { .. } => "Something went wrong. Please try again later.",
        }
    }

    /// Create a UsernameInvalid error
    pub fn username_invalid(username: &str) -> Self {
        EngineError::UsernameInvalid {
            username: username.to_string(),
        }
    }

    /// Create a UsernameTaken error
    pub fn username_taken(username: &str) -> Self {
        EngineError::UsernameTaken {
            username: username.to_string(),
        }
    }

    /// Create a PremiumImmutable error
    pub fn premium_immutable(username: &str) -> Self {
        EngineError::PremiumImmutable {
            username: username.to_string(),
        }
    }

    /// Create a RecipientNotFound error
    pub fn recipient_not_found(recipient: impl ToString) -> Self {
        EngineError::RecipientNotFound {
            recipient: recipient.to_string(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(caller: AccountId, operation: &str) -> Self {
        EngineError::Unauthorized {
            caller,
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidAccount error
    pub fn invalid_account(account: AccountId, role: &str) -> Self {
        EngineError::InvalidAccount {
            account,
            role: role.to_string(),
        }
    }

    /// Create a ReentrantCall error
    pub fn reentrant_call(operation: &str) -> Self {
        EngineError::ReentrantCall {
            operation: operation.to_string(),
        }
    }

    /// Create a TransferFailed error
    pub fn transfer_failed(operation: &str, source: LedgerError) -> Self {
        EngineError::TransferFailed {
            operation: operation.to_string(),
            source,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        EngineError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            message: message.into(),
        }
    }
}
