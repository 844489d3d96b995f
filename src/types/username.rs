//! Username validation and normalization
//!
//! Usernames are 1-32 characters drawn from `[0-9A-Za-z_]`. They are stored and
//! compared in lowercase, so `Alice`, `ALICE` and `alice` are the same identity.

use super::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum username length in characters
pub const MAX_USERNAME_LENGTH: usize = 32;

/// A validated, normalized (lowercase) username
///
/// The only way to build one is [`Username::parse`], so every value of this type
/// already satisfies the length and charset rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Validate and normalize a raw username
    ///
    /// # Errors
    ///
    /// Returns `UsernameInvalid` if the input is empty, longer than
    /// [`MAX_USERNAME_LENGTH`], or contains a character outside `[0-9A-Za-z_]`.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        if !is_valid_username(raw) {
            return Err(EngineError::username_invalid(raw));
        }
        Ok(Username(normalize(raw)))
    }

    /// The normalized form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the normalized string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check length and charset of a raw username
pub fn is_valid_username(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_USERNAME_LENGTH
        && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Lowercase a username
///
/// Charset validation restricts usernames to ASCII, so ASCII case folding is the
/// whole normalization.
pub fn normalize(raw: &str) -> String {
    raw.to_ascii_lowercase()
}
