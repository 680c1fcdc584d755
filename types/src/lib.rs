//! Core domain types for leakscope.
//!
//! This crate defines the data model shared by the analysis, enrichment,
//! streaming, and engine crates: raw analyzer diagnostics, semantic issue
//! groups, enrichment requests/results, stream frames, and run/buffer
//! identifiers. It is deliberately free of IO and async — everything here
//! is constructed from values and read through accessors.

mod diagnostic;
mod frame;
mod group;
mod ids;
mod text;

pub use diagnostic::{NoteRecord, PrimaryDiagnostic, Severity};
pub use frame::{EnrichedDiagnostic, PlaceholderItem, StreamFrame};
pub use group::{EnrichmentRequest, IssueGroup};
pub use ids::{BufferId, RunId};
pub use text::truncate_with_ellipsis;
