//! Analyzer subprocess invocation.
//!
//! The analyzer is a black box: we spawn it against one file, capture its
//! stdout/stderr, and trust its exit code. Exit 0 means the run succeeded
//! (the diagnostics may still be empty); anything else fails the run and
//! the captured stderr becomes the operator-visible error.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::AnalyzerConfig;

/// Run-fatal analyzer failures.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("analyzer '{command}' not found in PATH")]
    NotFound { command: String },
    #[error("failed to spawn analyzer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("analyzer exited with {code:?}: {stderr}")]
    ExitedNonZero { code: Option<i32>, stderr: String },
}

async fn capture(
    command: &str,
    file: &Path,
    trailing_args: &[String],
) -> Result<std::process::Output, AnalyzerError> {
    let resolved = which::which(command).map_err(|_| AnalyzerError::NotFound {
        command: command.to_string(),
    })?;

    Command::new(resolved)
        .arg(file)
        .args(trailing_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| AnalyzerError::Spawn {
            command: command.to_string(),
            source,
        })
}

/// Invoke the analyzer on `file` and return its captured stdout.
pub async fn run_analyzer(config: &AnalyzerConfig, file: &Path) -> Result<String, AnalyzerError> {
    let output = capture(&config.command, file, &config.args).await?;

    if !output.status.success() {
        return Err(AnalyzerError::ExitedNonZero {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Invoke the compiler AST dump on `file`.
///
/// Advisory only: any failure (missing compiler, nonzero exit) degrades to
/// `None` and the run proceeds without declaration context.
pub async fn run_ast_dump(config: &AnalyzerConfig, file: &Path) -> Option<String> {
    match capture(&config.ast_command, file, &config.ast_args).await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!(
                command = %config.ast_command,
                code = ?output.status.code(),
                "AST dump exited nonzero; continuing without context"
            );
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "AST dump unavailable; continuing without context");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_running(command: &str) -> AnalyzerConfig {
        AnalyzerConfig {
            command: command.to_string(),
            args: Vec::new(),
            ast_command: command.to_string(),
            ast_args: Vec::new(),
            ast_context: true,
        }
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        // `cat file` echoes the file's content back — a stand-in analyzer.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "demo.c:1:1: warning: w [check]").unwrap();

        let out = run_analyzer(&config_running("cat"), file.path())
            .await
            .unwrap();
        assert_eq!(out, "demo.c:1:1: warning: w [check]\n");
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let err = run_analyzer(
            &config_running("leakscope-test-no-such-binary"),
            Path::new("demo.c"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_stderr() {
        // A script standing in for a failing analyzer run.
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "echo 'file not found' >&2").unwrap();
        writeln!(script, "exit 2").unwrap();

        let err = run_analyzer(&config_running("sh"), script.path())
            .await
            .unwrap_err();
        match err {
            AnalyzerError::ExitedNonZero { code, stderr } => {
                assert_eq!(code, Some(2));
                assert!(stderr.contains("file not found"));
            }
            other => panic!("expected ExitedNonZero, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ast_dump_failure_degrades_to_none() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "exit 1").unwrap();

        assert!(
            run_ast_dump(&config_running("sh"), script.path())
                .await
                .is_none()
        );
        assert!(
            run_ast_dump(
                &config_running("leakscope-test-no-such-binary"),
                Path::new("demo.c")
            )
            .await
            .is_none()
        );
    }

    #[tokio::test]
    async fn ast_dump_success_returns_stdout() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "echo 'FunctionDecl'").unwrap();

        let dump = run_ast_dump(&config_running("sh"), script.path()).await;
        assert_eq!(dump.as_deref(), Some("FunctionDecl\n"));
    }
}
