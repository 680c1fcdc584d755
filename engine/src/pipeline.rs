//! Pipeline facade — the public API consumed by a front end.
//!
//! Owns the per-buffer [`DiagnosticStore`] and the event channel run tasks
//! report into. The consumer drives it from a single control thread:
//! `start_run` spawns the work, `poll_events` drains completed frames
//! without blocking, and the read accessors expose the store. Waiting on
//! subprocess output or enrichment responses never happens here.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use leakscope_enrich::Enricher;
use leakscope_types::{BufferId, EnrichedDiagnostic, RunId, StreamFrame};

use crate::analyzer::AnalyzerError;
use crate::config::Config;
use crate::run::{RunContext, RunEvent, run_pipeline};
use crate::store::DiagnosticStore;

/// Channel capacity between run tasks and the pipeline.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One drained pipeline event, after store bookkeeping.
#[derive(Debug)]
pub enum Polled {
    /// A frame from the buffer's current run, already applied to the
    /// store. Hand it to the wire if a remote consumer is attached.
    Frame {
        buffer: BufferId,
        frame: StreamFrame,
    },
    /// A frame from a superseded run, discarded. Expected during rapid
    /// re-runs, not an error.
    Stale { buffer: BufferId, run: RunId },
    /// The run never produced frames; the analyzer failed.
    Failed {
        buffer: BufferId,
        run: RunId,
        error: AnalyzerError,
    },
}

/// Public facade for the diagnostic pipeline.
pub struct Pipeline<E: Enricher> {
    enricher: Arc<E>,
    config: Config,
    store: DiagnosticStore,
    event_rx: mpsc::Receiver<RunEvent>,
    event_tx: mpsc::Sender<RunEvent>,
}

impl<E: Enricher> Pipeline<E> {
    #[must_use]
    pub fn new(config: Config, enricher: E) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            enricher: Arc::new(enricher),
            config,
            store: DiagnosticStore::new(),
            event_rx,
            event_tx,
        }
    }

    /// Start a run for `file` against `buffer`, superseding any run still
    /// in flight for that buffer. Must be called within a tokio runtime.
    pub fn start_run(&mut self, buffer: BufferId, file: PathBuf) -> RunId {
        let run = RunId::new();
        self.store.begin_run(buffer, run);
        tracing::info!(%buffer, %run, file = %file.display(), "starting analyzer run");

        let ctx = RunContext {
            analyzer: self.config.analyzer.clone(),
            note_budget: self.config.enrichment.note_budget,
            buffer,
            run,
            file,
        };
        tokio::spawn(run_pipeline(ctx, Arc::clone(&self.enricher), self.event_tx.clone()));
        run
    }

    /// Drain pending run events, up to `budget`. Non-blocking: returns
    /// immediately when the channel is empty.
    pub fn poll_events(&mut self, budget: usize) -> Vec<Polled> {
        let mut polled = Vec::new();
        while polled.len() < budget {
            match self.event_rx.try_recv() {
                Ok(event) => polled.push(self.handle_event(event)),
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        polled
    }

    fn handle_event(&mut self, event: RunEvent) -> Polled {
        match event {
            RunEvent::Frame { buffer, run, frame } => {
                let applied = match &frame {
                    StreamFrame::Loading(items) => self.store.apply_loading(buffer, run, items),
                    StreamFrame::Final(diags) => {
                        self.store.apply_final(buffer, run, diags.clone())
                    }
                };
                if applied {
                    Polled::Frame { buffer, frame }
                } else {
                    Polled::Stale { buffer, run }
                }
            }
            RunEvent::Failed { buffer, run, error } => {
                if self.store.is_current(buffer, run) {
                    tracing::warn!(%buffer, %run, %error, "analyzer run failed");
                    Polled::Failed { buffer, run, error }
                } else {
                    Polled::Stale { buffer, run }
                }
            }
        }
    }

    /// Current ordered diagnostics for a buffer (empty when unknown).
    #[must_use]
    pub fn diagnostics(&self, buffer: BufferId) -> &[EnrichedDiagnostic] {
        self.store.diagnostics(buffer)
    }

    /// Placeholder lines for groups still being enriched.
    #[must_use]
    pub fn placeholders(&self, buffer: BufferId) -> &[u32] {
        self.store.placeholders(buffer)
    }

    /// Drop all diagnostics for a buffer; in-flight runs for it become
    /// stale and their results are discarded on arrival.
    pub fn clear_buffer(&mut self, buffer: BufferId) {
        self.store.clear(buffer);
    }
}
