//! Run orchestration for the diagnostic pipeline.
//!
//! One *run* is an end-to-end trip for a (buffer, file) pair: spawn the
//! analyzer, parse and group its output, emit a `Loading` frame, fan out
//! enrichment calls concurrently, and emit a single sorted `Final` frame
//! once every call has settled. The [`Pipeline`] facade owns the per-buffer
//! [`DiagnosticStore`] and an event channel; the consumer drives everything
//! through non-blocking [`Pipeline::poll_events`] and never waits on
//! subprocess or network IO.
//!
//! Runs are tagged with a [`RunId`]; frames from a superseded run are
//! discarded at the store instead of clobbering newer state.

pub mod analyzer;
pub mod config;
pub mod pipeline;
pub mod store;

mod run;

pub use analyzer::AnalyzerError;
pub use config::{AnalyzerConfig, Config, EnrichmentConfig};
pub use pipeline::{Pipeline, Polled};
pub use store::DiagnosticStore;

pub use leakscope_types::{BufferId, RunId};
