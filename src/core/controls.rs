//! Safety controls: asset allowlist and circuit breaker
//!
//! Both are plain state owned by the settlement engine and changed only through
//! its owner-gated admin API.

use crate::types::AssetId;
use serde::Serialize;
use std::collections::HashMap;

/// Allowlist of assets the engine settles in
///
/// Keeps an append-only history of every asset ever listed. Removal only
/// clears the flag; the asset stays in the history.
#[derive(Debug, Clone, Default)]
pub struct AssetAllowlist {
    supported: HashMap<AssetId, bool>,
    history: Vec<AssetId>,
}

/// One allowlist history entry with its current flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssetListing {
    pub asset: AssetId,
    pub supported: bool,
}

impl AssetAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_supported(&self, asset: AssetId) -> bool {
        self.supported.get(&asset).copied().unwrap_or(false)
    }

    /// Enable `asset`; returns `true` if the flag changed
    pub fn add(&mut self, asset: AssetId) -> bool {
        match self.supported.insert(asset, true) {
            None => {
                self.history.push(asset);
                true
            }
            Some(previous) => !previous,
        }
    }

    /// Disable `asset`; returns `true` if the flag changed
    pub fn remove(&mut self, asset: AssetId) -> bool {
        match self.supported.get_mut(&asset) {
            Some(flag) if *flag => {
                *flag = false;
                true
            }
            _ => false,
        }
    }

    /// Every asset ever listed, in listing order, with its current flag
    pub fn listings(&self) -> Vec<AssetListing> {
        self.history
            .iter()
            .map(|&asset| AssetListing {
                asset,
                supported: self.is_supported(asset),
            })
            .collect()
    }
}

/// Engine-wide circuit breaker
///
/// Only explicit owner action moves between states; there is no timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Active,
    Paused,
}

impl EngineState {
    pub fn is_paused(&self) -> bool {
        matches!(self, EngineState::Paused)
    }
}
