//! Per-path lock table
//!
//! Backs the optional `Locked` relation consistency mode: every multi-file
//! relation update takes the locks of both endpoints for its whole
//! duration, so concurrent writers inside one process never interleave
//! between the outbound and inbound writes.
//!
//! Locks are acquired in path order, which rules out lock-order deadlocks
//! between two updates touching the same pair of paths.

use arbor_core::Path;
use dashmap::DashMap;
use parking_lot::{lock_api::ArcMutexGuard, Mutex, RawMutex};
use std::sync::Arc;

/// Idle entries are swept once the table grows past this size
const PRUNE_THRESHOLD: usize = 4096;

/// Map from path to mutex
#[derive(Debug, Default)]
pub struct PathLockTable {
    locks: DashMap<Path, Arc<Mutex<()>>>,
}

/// Guards held for the duration of one update
pub struct PathGuards {
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl PathLockTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every path in `paths` (duplicates are locked once)
    pub fn lock_all(&self, paths: &[&Path]) -> PathGuards {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune_idle();
        }

        let mut ordered: Vec<&Path> = paths.to_vec();
        ordered.sort();
        ordered.dedup();

        let guards = ordered
            .into_iter()
            .map(|path| {
                let mutex = self
                    .locks
                    .entry(path.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone();
                mutex.lock_arc()
            })
            .collect();

        PathGuards { _guards: guards }
    }

    /// Drop entries nobody holds
    pub fn prune_idle(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    /// Number of tracked paths
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no path is tracked
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
