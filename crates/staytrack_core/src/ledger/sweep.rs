//! Superseding of in-flight recalculations.
//!
//! Date-picker recalculation can be triggered on every edit. Each request
//! takes a fresh ticket from a `RecalcCoordinator`; a sweep holding an older
//! ticket stops at its next checkpoint with `EngineError::Superseded`.

use super::{EngineError, EngineResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues monotonically increasing recalculation tickets.
#[derive(Debug, Clone, Default)]
pub struct RecalcCoordinator {
    generation: Arc<AtomicU64>,
}

impl RecalcCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new recalculation, superseding every earlier guard.
    pub fn begin(&self) -> SweepGuard {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        SweepGuard {
            generation: Some(Arc::clone(&self.generation)),
            ticket,
        }
    }
}

/// Checkpoint handle passed into long sweeps.
#[derive(Debug, Clone)]
pub struct SweepGuard {
    generation: Option<Arc<AtomicU64>>,
    ticket: u64,
}

impl SweepGuard {
    /// A guard that is never superseded.
    pub fn unguarded() -> Self {
        Self {
            generation: None,
            ticket: 0,
        }
    }

    pub fn is_superseded(&self) -> bool {
        self.generation
            .as_ref()
            .is_some_and(|generation| generation.load(Ordering::Acquire) != self.ticket)
    }

    pub fn checkpoint(&self) -> EngineResult<()> {
        if self.is_superseded() {
            return Err(EngineError::Superseded);
        }
        Ok(())
    }
}
