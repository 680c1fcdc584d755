//! Stream-protocol frame payloads.
//!
//! The pipeline talks to its consumer through newline-delimited frames:
//! a cheap `Loading` frame as soon as issue groups are known, then exactly
//! one `Final` frame once every enrichment call has settled. The wire
//! format is a line-prefix tag (`LOADING: ` / `FINAL: `) followed by a JSON
//! array; serialization of the tag lives in `leakscope-stream`, the
//! payload shapes live here.

use serde::{Deserialize, Serialize};

/// Placeholder entry carried by a `Loading` frame: one per issue group,
/// holding only the representative line so the consumer can mark it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderItem {
    /// 0-indexed line number.
    pub line: u32,
}

/// The final, rendered diagnostic unit: an issue position plus the
/// enrichment service's summary and fix recommendation.
///
/// Only built from a validated service reply — a malformed reply drops the
/// diagnostic instead of fabricating content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedDiagnostic {
    pub file: String,
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column.
    pub col: u32,
    pub summary: String,
    pub fix: String,
}

/// One self-contained unit of the streaming protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Emitted as soon as groups are discovered, before enrichment.
    Loading(Vec<PlaceholderItem>),
    /// Emitted once per run, after all enrichment calls settle; sorted by
    /// (line, col) ascending with discovery order breaking ties.
    Final(Vec<EnrichedDiagnostic>),
}

impl StreamFrame {
    /// The wire tag for this frame kind.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Loading(_) => "LOADING",
            Self::Final(_) => "FINAL",
        }
    }
}
