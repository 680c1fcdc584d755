//! OpenAI-style chat completions client for issue summarization.
//!
//! One request per issue group, non-streaming. The model is instructed to
//! answer with a bare JSON object `{"summary": "...", "fix": "..."}`;
//! anything else fails validation and the group is dropped upstream.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use leakscope_types::{EnrichedDiagnostic, EnrichmentRequest, truncate_with_ellipsis};

use crate::retry::{RetryConfig, RetryOutcome, send_with_retry};
use crate::{EnrichError, Enricher};

/// Canonical chat completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Summarization is a small, cheap task; the mini-class model is plenty.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_COMPLETION_TOKENS: u32 = 200;
const TEMPERATURE: f64 = 0.2;
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Connection settings for the summarization service.
#[derive(Clone)]
pub struct EnrichOptions {
    api_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for EnrichOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichOptions")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EnrichOptions {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the deterministic per-group prompt. Positions are rendered
/// 1-based, matching how the analyzer (and the user's editor) display them.
#[must_use]
pub fn build_prompt(request: &EnrichmentRequest) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Summarize one C memory issue reported by a static analyzer."
    );
    let _ = writeln!(
        prompt,
        "File: {}, line {}, column {}.",
        request.file(),
        request.line() + 1,
        request.col() + 1
    );
    if !request.variables().is_empty() {
        let vars: Vec<String> = request
            .variables()
            .iter()
            .map(|v| format!("'{v}'"))
            .collect();
        let _ = writeln!(prompt, "Variables involved: {}.", vars.join(", "));
    }
    let _ = writeln!(
        prompt,
        "Severity: {}; category: {}.",
        request.severity().label(),
        request.category()
    );
    if let Some(context) = request.ast_context() {
        let _ = writeln!(prompt, "Declaration context: {context}.");
    }
    let _ = writeln!(prompt, "Analyzer output:\n{}", request.notes());
    let _ = write!(
        prompt,
        "Reply with a single JSON object with exactly two non-empty string fields: \
         \"summary\" (one sentence: what is wrong and where) and \
         \"fix\" (one sentence: the concrete remediation). \
         No other keys, no text outside the JSON object."
    );
    prompt
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ReplyFields {
    summary: String,
    fix: String,
}

/// Validate the service reply against the request it answers.
///
/// Strict by design: a reply that cannot be trusted verbatim is dropped,
/// never patched up.
fn parse_reply(request: &EnrichmentRequest, body: &str) -> Result<EnrichedDiagnostic, EnrichError> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| EnrichError::MalformedReply(format!("unparseable response body: {e}")))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| EnrichError::MalformedReply("response contains no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| EnrichError::MalformedReply("reply message has no content".to_string()))?;

    let fields: ReplyFields = serde_json::from_str(content.trim())
        .map_err(|e| EnrichError::MalformedReply(format!("reply is not a summary/fix object: {e}")))?;

    let summary = fields.summary.trim();
    let fix = fields.fix.trim();
    if summary.is_empty() || fix.is_empty() {
        return Err(EnrichError::MalformedReply(
            "summary or fix is empty".to_string(),
        ));
    }

    Ok(EnrichedDiagnostic {
        file: request.file().to_string(),
        line: request.line(),
        col: request.col(),
        summary: summary.to_string(),
        fix: fix.to_string(),
    })
}

/// Production [`Enricher`] backed by the chat completions endpoint.
pub struct LlmEnricher {
    client: reqwest::Client,
    options: EnrichOptions,
    retry: RetryConfig,
}

impl LlmEnricher {
    pub fn new(options: EnrichOptions, retry: RetryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(options.timeout)
            .build()?;
        Ok(Self {
            client,
            options,
            retry,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.options.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
            "response_format": { "type": "json_object" },
        })
    }
}

impl Enricher for LlmEnricher {
    async fn enrich(
        &self,
        request: EnrichmentRequest,
    ) -> Result<EnrichedDiagnostic, EnrichError> {
        let prompt = build_prompt(&request);
        let body = self.request_body(&prompt);

        let outcome = send_with_retry(
            || {
                self.client
                    .post(&self.options.api_url)
                    .bearer_auth(&self.options.api_key)
                    .json(&body)
            },
            &self.retry,
        )
        .await;

        match outcome {
            RetryOutcome::Success(response) => {
                let text = response.text().await.map_err(|e| EnrichError::Connection {
                    attempts: 1,
                    source: e,
                })?;
                parse_reply(&request, &text)
            }
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, "enrichment service rejected request");
                Err(EnrichError::Http {
                    status,
                    body: truncate_with_ellipsis(&body, MAX_ERROR_BODY_CHARS),
                })
            }
            RetryOutcome::ConnectionError { attempts, source } => {
                Err(EnrichError::Connection { attempts, source })
            }
        }
    }
}
