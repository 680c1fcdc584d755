//! Turning raw analyzer text into structured, grouped issues.
//!
//! This crate is the pure middle of the pipeline: it never does IO and it
//! never fails. [`parser`] reconstructs primary diagnostics with their
//! attached notes from clang-tidy stdout, [`group`] clusters them into
//! semantic issue groups and extracts variable/severity/category context,
//! and [`ast`] distills a clang AST dump into a one-line context string for
//! the enrichment prompt. Malformed input can only shrink the output.

pub mod ast;
pub mod group;
pub mod parser;

pub use ast::ast_context;
pub use group::group_diagnostics;
pub use parser::{RawLine, parse_analyzer_output};
