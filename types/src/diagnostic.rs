//! Raw analyzer diagnostics as reconstructed from clang-tidy stdout.

/// Severity of a primary diagnostic.
///
/// The analyzer emits more severity words than these (`note`, `remark`,
/// `fatal error`), but only `warning` and `error` lines start a primary
/// diagnostic; everything else is either a note or informational output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Parse the severity word from an analyzer line.
    ///
    /// Returns `None` for anything outside the primary-diagnostic set.
    /// Callers (boundary code) decide what to do with the rest.
    #[must_use]
    pub fn from_analyzer(word: &str) -> Option<Self> {
        match word {
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

/// A secondary analyzer message elaborating a primary diagnostic,
/// e.g. pointing at the allocation site of a leaked buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    /// 0-indexed line number.
    line: u32,
    /// 0-indexed column.
    col: u32,
    message: String,
}

impl NoteRecord {
    #[must_use]
    pub fn new(line: u32, col: u32, message: String) -> Self {
        Self { line, col, message }
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
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single analyzer-reported issue with its attached notes.
///
/// Fields are private; construction goes through [`PrimaryDiagnostic::new`]
/// and notes are attached one at a time by the parser. Immutable once the
/// parser hands it off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryDiagnostic {
    file: String,
    /// 0-indexed line number.
    line: u32,
    /// 0-indexed column.
    col: u32,
    severity: Severity,
    /// Check identifier, e.g. "clang-analyzer-unix.Malloc".
    check: String,
    message: String,
    /// Notes in the order the analyzer emitted them. All share `file`.
    notes: Vec<NoteRecord>,
}

impl PrimaryDiagnostic {
    #[must_use]
    pub fn new(
        file: String,
        line: u32,
        col: u32,
        severity: Severity,
        check: String,
        message: String,
    ) -> Self {
        Self {
            file,
            line,
            col,
            severity,
            check,
            message,
            notes: Vec::new(),
        }
    }

    /// Attach a note to this diagnostic. The parser guarantees the note was
    /// emitted for the same file; this type records it verbatim.
    pub fn attach_note(&mut self, note: NoteRecord) {
        self.notes.push(note);
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
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn check(&self) -> &str {
        &self.check
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    /// Format as `path:line:col: severity: message [check]` (1-indexed for
    /// display, matching the analyzer's own syntax).
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(
            "{}:{}:{}: {}: {} [{}]",
            self.file,
            self.line + 1,
            self.col + 1,
            self.severity.label(),
            self.message,
            self.check,
        )
    }
}
