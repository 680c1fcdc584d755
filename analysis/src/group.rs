//! Issue Grouper & Context Extractor.
//!
//! Groups primary diagnostics that describe one underlying memory incident
//! and derives the context the enrichment prompt needs: variable-name
//! candidates, a severity class, and a category label.
//!
//! Pairing is a fixed lookup table of check-name pairs, not a clustering
//! algorithm: two primaries merge only when their checks are a known pair
//! AND they sit on the same or an adjacent line of the same file. The
//! analyzer emits related reports back to back, so only the most recent
//! open group is a merge candidate.

use std::sync::OnceLock;

use regex::Regex;

use leakscope_types::{IssueGroup, PrimaryDiagnostic};

/// Check-name pairs treated as one incident, order-insensitive.
/// An allocation-path check and the leak check that consumes its state.
const PAIRED_CHECKS: &[(&str, &str)] = &[
    (
        "clang-analyzer-unix.Malloc",
        "clang-analyzer-alpha.unix.MallocChecker",
    ),
    (
        "clang-analyzer-unix.Malloc",
        "clang-analyzer-cplusplus.NewDeleteLeaks",
    ),
    (
        "clang-analyzer-cplusplus.NewDelete",
        "clang-analyzer-cplusplus.NewDeleteLeaks",
    ),
    (
        "clang-analyzer-unix.Malloc",
        "clang-analyzer-unix.MismatchedDeallocator",
    ),
];

/// Fixed check identifier → category label mapping. Unknown checks are
/// classified as "unknown"; the enrichment prompt states the category
/// verbatim, so labels stay short and lowercase.
const CHECK_CATEGORIES: &[(&str, &str)] = &[
    ("clang-analyzer-unix.Malloc", "leak"),
    ("clang-analyzer-alpha.unix.MallocChecker", "leak"),
    ("clang-analyzer-cplusplus.NewDeleteLeaks", "leak"),
    ("clang-analyzer-cplusplus.NewDelete", "use-after-free"),
    ("clang-analyzer-alpha.cplusplus.DoubleDelete", "double-free"),
    ("clang-analyzer-unix.MismatchedDeallocator", "mismatched-free"),
];

fn quoted_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([^']+)'").expect("quoted token pattern is valid"))
}

fn checks_paired(a: &str, b: &str) -> bool {
    PAIRED_CHECKS
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

fn category_for_check(check: &str) -> Option<&'static str> {
    CHECK_CATEGORIES
        .iter()
        .find(|(name, _)| *name == check)
        .map(|(_, label)| *label)
}

fn lines_adjacent(a: u32, b: u32) -> bool {
    a.abs_diff(b) <= 1
}

/// Whether `candidate` belongs to the incident already collected in
/// `members`: same file, a paired check, and same-or-adjacent line with at
/// least one existing member.
fn belongs_to(members: &[PrimaryDiagnostic], candidate: &PrimaryDiagnostic) -> bool {
    members.iter().any(|m| {
        m.file() == candidate.file()
            && checks_paired(m.check(), candidate.check())
            && lines_adjacent(m.line(), candidate.line())
    })
}

/// Extract variable-name candidates from the message and note text of the
/// members, in order of appearance: tokens in single quotes, the analyzer's
/// quoting convention for names. Distinct, order-preserving.
fn extract_variables(members: &[PrimaryDiagnostic]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut push = |text: &str| {
        for caps in quoted_token_re().captures_iter(text) {
            let token = caps[1].to_string();
            if !seen.contains(&token) {
                seen.push(token);
            }
        }
    };
    for member in members {
        push(member.message());
        for note in member.notes() {
            push(note.message());
        }
    }
    seen
}

/// The group's category: the first member whose check has a known mapping
/// wins; a group of entirely unknown checks is "unknown".
fn category_for_members(members: &[PrimaryDiagnostic]) -> String {
    members
        .iter()
        .find_map(|m| category_for_check(m.check()))
        .unwrap_or("unknown")
        .to_string()
}

/// Cluster parsed primaries into semantic issue groups, preserving
/// discovery order. Ungrouped primaries form singleton groups.
///
/// Idempotent in the sense that re-grouping the flattened members of the
/// result reproduces the same groups.
#[must_use]
pub fn group_diagnostics(primaries: Vec<PrimaryDiagnostic>) -> Vec<IssueGroup> {
    let mut clusters: Vec<Vec<PrimaryDiagnostic>> = Vec::new();

    for diag in primaries {
        match clusters.last_mut() {
            Some(open) if belongs_to(open, &diag) => open.push(diag),
            _ => clusters.push(vec![diag]),
        }
    }

    clusters
        .into_iter()
        .filter_map(|members| {
            let variables = extract_variables(&members);
            let category = category_for_members(&members);
            IssueGroup::from_members(members, variables, category)
        })
        .collect()
}
