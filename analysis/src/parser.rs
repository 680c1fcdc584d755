//! Raw Output Parser — analyzer stdout text to primary diagnostics.
//!
//! clang-tidy emits diagnostics in a fixed line syntax:
//!
//! ```text
//! demo.c:12:5: warning: Potential leak of memory pointed to by 'ptr' [clang-analyzer-unix.Malloc]
//! demo.c:10:15: note: Memory is allocated
//! ```
//!
//! Notes carry no explicit parent reference; the analyzer emits them
//! immediately after their primary, so a note attaches to the most recently
//! seen primary. Banner lines, suppression counters, and anything else that
//! matches neither pattern are skipped.

use std::sync::OnceLock;

use regex::Regex;

use leakscope_types::{NoteRecord, PrimaryDiagnostic, Severity};

fn primary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): (?P<sev>[a-z]+(?: [a-z]+)?): (?P<msg>.*?) \[(?P<check>[^\[\]]+)\]\s*$")
            .expect("primary diagnostic pattern is valid")
    })
}

fn note_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): note: (?P<msg>.*)$")
            .expect("note pattern is valid")
    })
}

/// One classified line of analyzer stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawLine {
    /// A diagnostic line with a recognized severity and check identifier.
    Primary(PrimaryDiagnostic),
    /// A note line; `file` is kept so attachment can verify it matches.
    Note { file: String, note: NoteRecord },
    /// Banner, summary counter, source echo, caret line — ignored.
    Unrecognized,
}

/// The analyzer reports 1-based positions; the consumer addresses buffer
/// lines 0-based. `0` never appears in well-formed output, but saturate
/// rather than wrap if it does.
fn to_zero_based(n: u32) -> u32 {
    n.saturating_sub(1)
}

/// Classify a single physical line of analyzer output.
#[must_use]
pub fn classify_line(line: &str) -> RawLine {
    // The note pattern is a special case of the primary pattern's shape,
    // so try it first: a primary match would swallow "note" as a severity
    // word only if the line also carried a [check] suffix, which notes
    // never do.
    if let Some(caps) = note_re().captures(line) {
        let (Ok(lnum), Ok(col)) = (caps["line"].parse::<u32>(), caps["col"].parse::<u32>()) else {
            return RawLine::Unrecognized;
        };
        return RawLine::Note {
            file: caps["file"].to_string(),
            note: NoteRecord::new(
                to_zero_based(lnum),
                to_zero_based(col),
                caps["msg"].to_string(),
            ),
        };
    }

    if let Some(caps) = primary_re().captures(line) {
        let Some(severity) = Severity::from_analyzer(&caps["sev"]) else {
            // "note", "remark", "fatal error" — informational, not a primary.
            return RawLine::Unrecognized;
        };
        let (Ok(lnum), Ok(col)) = (caps["line"].parse::<u32>(), caps["col"].parse::<u32>()) else {
            return RawLine::Unrecognized;
        };
        return RawLine::Primary(PrimaryDiagnostic::new(
            caps["file"].to_string(),
            to_zero_based(lnum),
            to_zero_based(col),
            severity,
            caps["check"].to_string(),
            caps["msg"].to_string(),
        ));
    }

    RawLine::Unrecognized
}

/// Parse the full captured stdout of one analyzer invocation.
///
/// Total over arbitrary input: malformed lines are skipped, a note without
/// a preceding primary (or for a different file) is dropped, and the worst
/// case is an empty result.
#[must_use]
pub fn parse_analyzer_output(output: &str) -> Vec<PrimaryDiagnostic> {
    let mut primaries: Vec<PrimaryDiagnostic> = Vec::new();

    for line in output.lines() {
        match classify_line(line) {
            RawLine::Primary(diag) => primaries.push(diag),
            RawLine::Note { file, note } => match primaries.last_mut() {
                Some(current) if current.file() == file => current.attach_note(note),
                Some(_) => {
                    tracing::debug!(file = %file, "note references a different file; dropped");
                }
                None => {
                    tracing::debug!(file = %file, "note with no preceding primary; dropped");
                }
            },
            RawLine::Unrecognized => {}
        }
    }

    primaries
}
