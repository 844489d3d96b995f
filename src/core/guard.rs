//! Non-reentrant entry guard
//!
//! Every mutating entry point of the registry and the engine holds a
//! [`GuardToken`] for the duration of the call. Both components share one
//! guard, so it acts as a single lock over one logical operation:
//! - Calls from other threads wait their turn
//! - A nested call on the holding thread (for instance from an asset transfer
//!   hook) is rejected with `ReentrantCall` instead of interleaving with the
//!   outer operation

use crate::types::EngineError;
use parking_lot::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Exclusive entry lock shared by the registry and the engine
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    lock: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an operation in progress, waiting for any other thread's operation
    ///
    /// # Errors
    ///
    /// Returns `ReentrantCall` if the calling thread already holds the guard.
    pub fn enter(&self, operation: &str) -> Result<GuardToken<'_>, EngineError> {
        let current = thread::current().id();
        // Only the current thread can set the holder to its own id
        if *self.holder.lock() == Some(current) {
            tracing::warn!(operation, "Re-entrant call rejected");
            return Err(EngineError::reentrant_call(operation));
        }

        let lock = self.lock.lock();
        *self.holder.lock() = Some(current);
        Ok(GuardToken {
            guard: self,
            _lock: lock,
        })
    }

    /// Whether an operation is currently in flight
    pub fn is_entered(&self) -> bool {
        self.holder.lock().is_some()
    }
}

/// Releases the guard when dropped, on success and on early error return alike
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        // The lock itself is released after this, when `_lock` drops
        *self.guard.holder.lock() = None;
    }
}
