//! # Level Mailbox
//!
//! Single-slot hand-off between the ingestion loop (writer) and the render
//! loop (reader). Overwrite-on-write, non-blocking drain: only the latest
//! discretized level matters, so there is no queue, no backpressure, and no
//! guarantee that every published value is ever observed — a slow reader
//! simply misses intermediate publishes.

use crate::DiscreteLevel;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Single-slot, overwrite-on-write shared cell for the latest level.
///
/// Created once at startup in the "absent" state and shared between the two
/// loops via `Arc`. Reads and writes are atomic with respect to each other
/// (the slot is mutex-guarded); the level itself is copied in and out, so
/// no reference ever crosses the loops.
#[derive(Debug, Default)]
pub struct LevelMailbox {
    slot: Mutex<Option<DiscreteLevel>>,
}

impl LevelMailbox {
    /// A mailbox with nothing published yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a level, overwriting whatever was in the slot.
    pub fn publish(&self, level: DiscreteLevel) {
        *self.lock() = Some(level);
    }

    /// Drain the slot without blocking.
    ///
    /// Returns `None` when nothing has been published since the last drain;
    /// the caller is expected to retain its own copy of the last value.
    pub fn take(&self) -> Option<DiscreteLevel> {
        self.lock().take()
    }

    // A poisoned slot still holds a valid copied level; recover it rather
    // than propagating the panic of whichever loop died holding the lock.
    fn lock(&self) -> MutexGuard<'_, Option<DiscreteLevel>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
