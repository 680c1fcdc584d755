//! Enrichment client — turns one issue group into one rendered diagnostic.
//!
//! The pipeline hands each [`EnrichmentRequest`] to an [`Enricher`]; the
//! production implementation ([`LlmEnricher`]) builds a deterministic
//! prompt, calls the summarization service (an OpenAI-style chat
//! completions endpoint), and validates the structured reply. A reply
//! missing either field, carrying the wrong types, or empty strings is a
//! failure — content is never guessed on the service's behalf.
//!
//! Calls for independent requests may run concurrently; this crate imposes
//! no ordering. Transient service errors are retried with bounded
//! exponential backoff (see [`retry`]) before a failure is surfaced.

pub mod retry;

mod openai;

pub use openai::{EnrichOptions, LlmEnricher, build_prompt};

use leakscope_types::{EnrichedDiagnostic, EnrichmentRequest};

/// A failed enrichment call. Per-group and non-fatal to the run: the
/// group is omitted from the final frame.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Transport-level failure after exhausting retries.
    #[error("enrichment request failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status (after retries for
    /// the retryable ones).
    #[error("enrichment service returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The reply did not contain a well-formed `{summary, fix}` object.
    #[error("malformed enrichment reply: {0}")]
    MalformedReply(String),
}

/// The seam between the pipeline and the summarization service.
///
/// The engine is generic over this so orchestration can be exercised with
/// deterministic fakes.
pub trait Enricher: Send + Sync + 'static {
    fn enrich(
        &self,
        request: EnrichmentRequest,
    ) -> impl Future<Output = Result<EnrichedDiagnostic, EnrichError>> + Send;
}
