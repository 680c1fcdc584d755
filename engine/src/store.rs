//! Per-buffer diagnostic store with run supersession.
//!
//! The store is the only shared mutable state in the pipeline and the
//! authority on what a buffer currently displays. Updates are whole-set
//! replacements keyed by [`RunId`]: a frame from a run that is no longer
//! the buffer's current run is discarded, so a consumer can never observe
//! a mix of two runs.

use std::collections::HashMap;

use leakscope_types::{BufferId, EnrichedDiagnostic, PlaceholderItem, RunId};

/// State for one buffer: the run it tracks and what that run has produced
/// so far.
#[derive(Debug)]
struct RunState {
    run: RunId,
    /// Placeholder lines from the `Loading` frame, 0-indexed.
    placeholders: Vec<u32>,
    diagnostics: Vec<EnrichedDiagnostic>,
}

/// Per-buffer authoritative diagnostic sets.
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    buffers: HashMap<BufferId, RunState>,
}

impl DiagnosticStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `run` as the buffer's current run.
    ///
    /// Previously displayed diagnostics stay visible until the new run's
    /// `Loading` frame arrives; frames from any older run are stale from
    /// this point on.
    pub fn begin_run(&mut self, buffer: BufferId, run: RunId) {
        match self.buffers.get_mut(&buffer) {
            Some(state) => state.run = run,
            None => {
                self.buffers.insert(
                    buffer,
                    RunState {
                        run,
                        placeholders: Vec::new(),
                        diagnostics: Vec::new(),
                    },
                );
            }
        }
    }

    /// Whether `run` is still the buffer's current run.
    #[must_use]
    pub fn is_current(&self, buffer: BufferId, run: RunId) -> bool {
        self.buffers.get(&buffer).is_some_and(|s| s.run == run)
    }

    /// Apply a `Loading` frame: clear the previous diagnostics immediately
    /// (placeholders must be visibly distinct from stale data) and record
    /// the placeholder lines.
    ///
    /// Returns `false` for a stale run; the frame is then discarded.
    pub fn apply_loading(
        &mut self,
        buffer: BufferId,
        run: RunId,
        items: &[PlaceholderItem],
    ) -> bool {
        let Some(state) = self.buffers.get_mut(&buffer).filter(|s| s.run == run) else {
            tracing::debug!(%buffer, %run, "discarding loading frame from superseded run");
            return false;
        };
        state.diagnostics.clear();
        state.placeholders = items.iter().map(|i| i.line).collect();
        true
    }

    /// Apply a `Final` frame: replace the entire diagnostic set atomically.
    ///
    /// Returns `false` for a stale run; the frame is then discarded.
    pub fn apply_final(
        &mut self,
        buffer: BufferId,
        run: RunId,
        diagnostics: Vec<EnrichedDiagnostic>,
    ) -> bool {
        let Some(state) = self.buffers.get_mut(&buffer).filter(|s| s.run == run) else {
            tracing::debug!(%buffer, %run, "discarding final frame from superseded run");
            return false;
        };
        state.placeholders.clear();
        state.diagnostics = diagnostics;
        true
    }

    /// Current ordered diagnostics for a buffer; empty when unknown.
    #[must_use]
    pub fn diagnostics(&self, buffer: BufferId) -> &[EnrichedDiagnostic] {
        self.buffers
            .get(&buffer)
            .map_or(&[], |s| s.diagnostics.as_slice())
    }

    /// Placeholder lines currently marking in-flight groups.
    #[must_use]
    pub fn placeholders(&self, buffer: BufferId) -> &[u32] {
        self.buffers
            .get(&buffer)
            .map_or(&[], |s| s.placeholders.as_slice())
    }

    /// Drop all state for a buffer (e.g. the buffer was closed). In-flight
    /// frames for it become stale and will be discarded on arrival.
    pub fn clear(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }
}
