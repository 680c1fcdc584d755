//! Semantic issue groups and the enrichment requests derived from them.

use crate::diagnostic::{PrimaryDiagnostic, Severity};
use crate::text::truncate_with_ellipsis;

/// One or more primary diagnostics judged to describe the same underlying
/// memory issue (e.g. an allocation paired with its missing-free report).
///
/// Invariants, established at construction:
/// - `members` is non-empty and sorted by (line, col) ascending;
/// - the representative line/col is that of the *first* diagnostic in
///   discovery order, captured before sorting;
/// - `severity` is the maximum severity among members;
/// - `variables` holds at most three distinct candidates in order of
///   appearance.
#[derive(Debug, Clone)]
pub struct IssueGroup {
    members: Vec<PrimaryDiagnostic>,
    /// Representative position: 0-indexed line of the first member seen.
    line: u32,
    col: u32,
    variables: Vec<String>,
    severity: Severity,
    category: String,
}

/// Cap on extracted variable-name candidates per group.
pub const MAX_VARIABLE_CANDIDATES: usize = 3;

impl IssueGroup {
    /// Build a group from member diagnostics in discovery order.
    ///
    /// Returns `None` for an empty member list — a group without a
    /// diagnostic has no representative position and no meaning.
    #[must_use]
    pub fn from_members(
        members: Vec<PrimaryDiagnostic>,
        mut variables: Vec<String>,
        category: String,
    ) -> Option<Self> {
        let first = members.first()?;
        let (line, col) = (first.line(), first.col());
        let severity = members
            .iter()
            .map(PrimaryDiagnostic::severity)
            .max()
            .unwrap_or(first.severity());
        variables.truncate(MAX_VARIABLE_CANDIDATES);

        let mut members = members;
        members.sort_by_key(|d| (d.line(), d.col()));

        Some(Self {
            members,
            line,
            col,
            variables,
            severity,
            category,
        })
    }

    /// Member diagnostics, sorted by (line, col) ascending.
    #[must_use]
    pub fn members(&self) -> &[PrimaryDiagnostic] {
        &self.members
    }

    /// 0-indexed representative line (first diagnostic in discovery order).
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 0-indexed representative column.
    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Extracted variable-name candidates, at most three, in order of
    /// appearance. Empty when nothing quotable was found.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Maximum severity among member diagnostics.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Classification label derived from the check identifier
    /// ("leak", "use-after-free", ..., "unknown").
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// File of the group — all members share it by construction upstream.
    #[must_use]
    pub fn file(&self) -> &str {
        self.members[0].file()
    }
}

/// Everything the enrichment service needs to summarize one issue group.
///
/// Immutable and one-to-one with the [`IssueGroup`] it was derived from.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    file: String,
    line: u32,
    col: u32,
    variables: Vec<String>,
    severity: Severity,
    category: String,
    /// Member messages and note text, newline-joined and length-bounded.
    notes: String,
    /// Compact AST-derived context, when the dump produced any.
    ast_context: Option<String>,
}

impl EnrichmentRequest {
    /// Derive a request from a group, bounding the concatenated note text
    /// to `note_budget` characters.
    #[must_use]
    pub fn from_group(group: &IssueGroup, note_budget: usize, ast_context: Option<String>) -> Self {
        let mut notes = String::new();
        for member in group.members() {
            if !notes.is_empty() {
                notes.push('\n');
            }
            notes.push_str(member.message());
            for note in member.notes() {
                notes.push('\n');
                notes.push_str(note.message());
            }
        }

        Self {
            file: group.file().to_string(),
            line: group.line(),
            col: group.col(),
            variables: group.variables().to_vec(),
            severity: group.severity(),
            category: group.category().to_string(),
            notes: truncate_with_ellipsis(&notes, note_budget),
            ast_context,
        }
    }

    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 0-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 0-indexed column.
    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Bounded, newline-joined message and note text.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn ast_context(&self) -> Option<&str> {
        self.ast_context.as_deref()
    }
}
