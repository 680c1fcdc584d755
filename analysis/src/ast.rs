//! AST-context extraction from a clang `-ast-dump` of the analyzed file.
//!
//! The dump is line-oriented; declarations carry `line:<N>` position
//! markers and quote names/types in single quotes:
//!
//! ```text
//! `-FunctionDecl 0x... <line:5:1, line:9:1> line:5:6 used leaky 'void ()'
//!   `-VarDecl 0x... <col:3, col:23> col:9 used ptr 'char *' cinit
//!     `-CallExpr 0x... <col:15, col:23> 'void *' ... 'malloc' ...
//! ```
//!
//! From the lines mentioning the issue's source line we pull the enclosing
//! function name, the variable's declared type, and whether an allocation
//! call is present. The result is advisory prompt context only; an absent
//! or unhelpful dump yields `None`.

const ALLOCATION_FUNCS: &[&str] = &["malloc", "calloc", "free"];

fn quoted_segments(line: &str) -> Vec<&str> {
    line.split('\'').collect()
}

fn function_name(line: &str) -> Option<&str> {
    if !line.contains("FunctionDecl") || !line.contains('\'') {
        return None;
    }
    let parts = quoted_segments(line);
    // Quoted segments alternate outside/inside; the first inside segment
    // is the declared name's type signature region in some dump layouts,
    // but the name itself precedes the quote. Take the token before the
    // first quote.
    let before = parts.first()?;
    before.split_whitespace().last()
}

fn var_decl_type<'a>(line: &'a str, var: &str) -> Option<&'a str> {
    if !line.contains("VarDecl") || !line.contains(var) {
        return None;
    }
    let parts = quoted_segments(line);
    if parts.len() < 3 {
        return None;
    }
    // The declared type is the last quoted segment on the line.
    Some(parts[parts.len() - 2])
}

fn is_allocation_call(line: &str) -> bool {
    line.contains("CallExpr") || ALLOCATION_FUNCS.iter().any(|f| line.contains(f))
}

/// Distill a compact context string for the issue at `line_1based`.
///
/// Scans dump lines that mention `line:<N>` for the enclosing function,
/// the variable's declared type (when `var` is known), and allocation
/// calls. Returns `None` when the dump contributes nothing.
#[must_use]
pub fn ast_context(dump: &str, line_1based: u32, var: Option<&str>) -> Option<String> {
    if dump.is_empty() {
        return None;
    }

    let marker = format!("line:{line_1based}");
    let mut parts: Vec<String> = Vec::new();
    let mut push_unique = |entry: String| {
        if !parts.contains(&entry) {
            parts.push(entry);
        }
    };

    for line in dump.lines() {
        if !line.contains(&marker) {
            continue;
        }

        if let Some(name) = function_name(line) {
            push_unique(format!("function: {name}"));
            continue;
        }

        if let Some(var) = var
            && let Some(ty) = var_decl_type(line, var)
        {
            push_unique(format!("type: {ty}"));
            continue;
        }

        if is_allocation_call(line) {
            push_unique("allocation call found".to_string());
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
