//! Configuration loading for the pipeline.
//!
//! TOML with serde defaults throughout: a missing file, a missing section,
//! or a missing key all resolve to a working default, so a fresh install
//! needs no configuration at all. Only unparseable TOML is an error; the
//! caller decides whether to abort or warn and fall back.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration, loaded from `~/.config/leakscope/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// How to invoke the static analyzer (and the optional AST dump).
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Analyzer executable, resolved on PATH.
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments appended after the target file. clang-tidy takes compiler
    /// flags after a `--` separator.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Compiler executable used for the AST dump.
    #[serde(default = "default_ast_command")]
    pub ast_command: String,
    /// Arguments appended after the target file for the AST dump.
    #[serde(default = "default_ast_args")]
    pub ast_args: Vec<String>,
    /// Whether to run the AST dump at all. Purely additive prompt context.
    #[serde(default = "default_true")]
    pub ast_context: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            ast_command: default_ast_command(),
            ast_args: default_ast_args(),
            ast_context: true,
        }
    }
}

/// Summarization service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Endpoint URL; defaults to the OpenAI chat completions endpoint.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Model name; defaults to the client's mini-class model.
    #[serde(default)]
    pub model: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries per request beyond the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Character budget for the concatenated note text in a prompt.
    #[serde(default = "default_note_budget")]
    pub note_budget: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            model: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            note_budget: default_note_budget(),
        }
    }
}

fn default_command() -> String {
    "clang-tidy".to_string()
}

fn default_args() -> Vec<String> {
    vec!["--".to_string(), "-std=c11".to_string()]
}

fn default_ast_command() -> String {
    "clang".to_string()
}

fn default_ast_args() -> Vec<String> {
    vec![
        "-Xclang".to_string(),
        "-ast-dump".to_string(),
        "-fsyntax-only".to_string(),
        "-std=c11".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_note_budget() -> usize {
    480
}

/// Default config file location.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("leakscope").join("config.toml"))
}

/// Load configuration from the default location; a missing file is the
/// default configuration.
pub fn load() -> anyhow::Result<Config> {
    match config_path() {
        Some(path) => load_from(&path),
        None => Ok(Config::default()),
    }
}

/// Load configuration from an explicit path; a missing file is the default
/// configuration, unreadable or unparseable content is an error.
pub fn load_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    let config = toml::from_str(&text)
        .map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.analyzer.command, "clang-tidy");
        assert_eq!(config.analyzer.args, ["--", "-std=c11"]);
        assert!(config.analyzer.ast_context);
        assert_eq!(config.enrichment.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.enrichment.max_retries, 2);
    }

    #[test]
    fn empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analyzer.command, "clang-tidy");
        assert_eq!(config.enrichment.timeout_secs, 30);
    }

    #[test]
    fn partial_section_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analyzer]
            command = "clang-tidy-19"

            [enrichment]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.analyzer.command, "clang-tidy-19");
        assert_eq!(config.analyzer.args, ["--", "-std=c11"]);
        assert_eq!(config.enrichment.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.enrichment.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.analyzer.command, "clang-tidy");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "analyzer = not toml [").unwrap();
        assert!(load_from(&path).is_err());
    }
}
