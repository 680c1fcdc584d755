//! One pipeline run: analyzer → parse → group → enrich → frames.
//!
//! The run task owns all the blocking-ish work (subprocess, network) and
//! talks back over an event channel. Enrichment calls for a run are issued
//! concurrently and may settle in any order; the single `Final` frame is
//! emitted only after the last one, with its diagnostics deterministically
//! sorted, so a consumer never observes out-of-order results.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use leakscope_analysis::{ast_context, group_diagnostics, parse_analyzer_output};
use leakscope_enrich::Enricher;
use leakscope_types::{
    BufferId, EnrichedDiagnostic, EnrichmentRequest, IssueGroup, PlaceholderItem, RunId,
    StreamFrame,
};

use crate::analyzer::{self, AnalyzerError};
use crate::config::AnalyzerConfig;

/// What a run task reports back to the pipeline.
#[derive(Debug)]
pub(crate) enum RunEvent {
    Frame {
        buffer: BufferId,
        run: RunId,
        frame: StreamFrame,
    },
    Failed {
        buffer: BufferId,
        run: RunId,
        error: AnalyzerError,
    },
}

/// Everything a run task needs, owned, so it can outlive the caller.
pub(crate) struct RunContext {
    pub analyzer: AnalyzerConfig,
    pub note_budget: usize,
    pub buffer: BufferId,
    pub run: RunId,
    pub file: PathBuf,
}

/// Drive one run to completion, emitting events as it goes.
///
/// Emits either `Loading` then `Final`, or a single `Failed` — never a
/// partial mix. A closed event channel aborts quietly: the pipeline that
/// would consume the frames is gone.
pub(crate) async fn run_pipeline<E: Enricher>(
    ctx: RunContext,
    enricher: Arc<E>,
    events: mpsc::Sender<RunEvent>,
) {
    let output = match analyzer::run_analyzer(&ctx.analyzer, &ctx.file).await {
        Ok(output) => output,
        Err(error) => {
            let _ = events
                .send(RunEvent::Failed {
                    buffer: ctx.buffer,
                    run: ctx.run,
                    error,
                })
                .await;
            return;
        }
    };

    let groups = group_diagnostics(parse_analyzer_output(&output));
    tracing::info!(
        buffer = %ctx.buffer,
        run = %ctx.run,
        groups = groups.len(),
        "analyzer run parsed"
    );

    let placeholders: Vec<PlaceholderItem> = groups
        .iter()
        .map(|g| PlaceholderItem { line: g.line() })
        .collect();
    let sent = events
        .send(RunEvent::Frame {
            buffer: ctx.buffer,
            run: ctx.run,
            frame: StreamFrame::Loading(placeholders),
        })
        .await;
    if sent.is_err() {
        return;
    }

    let ast_dump = if ctx.analyzer.ast_context && !groups.is_empty() {
        analyzer::run_ast_dump(&ctx.analyzer, &ctx.file).await
    } else {
        None
    };

    let diagnostics =
        enrich_groups(enricher, groups, ctx.note_budget, ast_dump.as_deref()).await;

    let _ = events
        .send(RunEvent::Frame {
            buffer: ctx.buffer,
            run: ctx.run,
            frame: StreamFrame::Final(diagnostics),
        })
        .await;
}

/// Enrich every group concurrently and return the successes, sorted by
/// (line, col) ascending with discovery order breaking ties.
///
/// Failed enrichments are logged and omitted — the final frame carries
/// best-effort partial results, never fabricated ones.
pub(crate) async fn enrich_groups<E: Enricher>(
    enricher: Arc<E>,
    groups: Vec<IssueGroup>,
    note_budget: usize,
    ast_dump: Option<&str>,
) -> Vec<EnrichedDiagnostic> {
    let mut calls = JoinSet::new();
    for (idx, group) in groups.iter().enumerate() {
        let context = ast_dump.and_then(|dump| {
            ast_context(
                dump,
                group.line() + 1,
                group.variables().first().map(String::as_str),
            )
        });
        let request = EnrichmentRequest::from_group(group, note_budget, context);
        let enricher = Arc::clone(&enricher);
        calls.spawn(async move { (idx, enricher.enrich(request).await) });
    }

    let mut settled: Vec<(usize, EnrichedDiagnostic)> = Vec::new();
    while let Some(joined) = calls.join_next().await {
        match joined {
            Ok((idx, Ok(diagnostic))) => settled.push((idx, diagnostic)),
            Ok((idx, Err(error))) => {
                tracing::warn!(group = idx, %error, "enrichment failed; omitting group");
            }
            Err(error) => {
                tracing::warn!(%error, "enrichment task aborted; omitting group");
            }
        }
    }

    settled.sort_by_key(|(idx, d)| (d.line, d.col, *idx));
    settled.into_iter().map(|(_, d)| d).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use leakscope_enrich::{EnrichError, Enricher};
    use leakscope_types::{EnrichedDiagnostic, EnrichmentRequest};

    /// Deterministic enricher for orchestration tests: per-line delays to
    /// force arbitrary completion orders, per-line failures.
    #[derive(Debug, Default)]
    pub(crate) struct FakeEnricher {
        pub delays_ms: HashMap<u32, u64>,
        pub fail_lines: HashSet<u32>,
    }

    impl FakeEnricher {
        pub fn instant() -> Self {
            Self::default()
        }
    }

    impl Enricher for FakeEnricher {
        async fn enrich(
            &self,
            request: EnrichmentRequest,
        ) -> Result<EnrichedDiagnostic, EnrichError> {
            if let Some(ms) = self.delays_ms.get(&request.line()) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.fail_lines.contains(&request.line()) {
                return Err(EnrichError::MalformedReply("fake failure".to_string()));
            }
            Ok(EnrichedDiagnostic {
                file: request.file().to_string(),
                line: request.line(),
                col: request.col(),
                summary: format!(
                    "{} line {} [{}]",
                    request.file(),
                    request.line(),
                    request.variables().join(",")
                ),
                fix: "fix".to_string(),
            })
        }
    }
}
