//! Phrase proposer backed by a local Ollama server.
//!
//! Sends each page's text to `/api/generate` with JSON output requested and
//! parses the reply with [`parse_phrase_response`]. Rate limiting and server
//! errors are retried with exponential backoff.

use std::time::Duration;

use serde_json::{Value, json};

use crate::proposer::{Phrase, PhraseProposer, ProposalError, parse_phrase_response};

/// Default Ollama endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Settings for [`OllamaProposer`].
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Base URL of the server, without the `/api/...` path.
    pub endpoint: String,
    pub model: String,
    /// Sampling temperature (default: 0.2).
    pub temperature: f32,
    /// Per-request timeout (default: 120 s).
    pub timeout: Duration,
    /// Retries after a 429 or 5xx response (default: 2).
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_base_delay: Duration,
    /// Pages whose trimmed text has fewer characters are not sent (default: 50).
    pub min_page_chars: usize,
    /// Page text beyond this many characters is cut from the prompt (default: 10 000).
    pub max_input_chars: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            min_page_chars: 50,
            max_input_chars: 10_000,
        }
    }
}

impl OllamaConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint.trim_end_matches('/'))
    }
}

/// Asks a local model which excerpts of a page to highlight.
#[derive(Debug, Clone)]
pub struct OllamaProposer {
    config: OllamaConfig,
    client: reqwest::blocking::Client,
}

impl OllamaProposer {
    /// Create a proposer with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, ProposalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProposalError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
            "options": { "temperature": self.config.temperature },
        })
    }

    fn generate(&self, prompt: &str) -> Result<String, ProposalError> {
        let url = self.config.generate_url();
        let body = self.request_body(prompt);
        let mut attempt = 0u32;

        loop {
            tracing::debug!(%url, model = %self.config.model, attempt, "sending generate request");
            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .map_err(|e| ProposalError::Transport(e.to_string()))?;

            let status = resp.status();
            if status.is_success() {
                let value: Value = resp
                    .json()
                    .map_err(|e| ProposalError::Malformed(format!("invalid response body: {e}")))?;
                return value
                    .get("response")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ProposalError::Malformed("response has no \"response\" string".to_string())
                    });
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if retryable && attempt < self.config.max_retries {
                let delay = backoff_delay(self.config.retry_base_delay, attempt);
                tracing::warn!(
                    status = status.as_u16(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "generate request failed, retrying"
                );
                std::thread::sleep(delay);
                attempt += 1;
                continue;
            }

            let body = resp.text().unwrap_or_default();
            return Err(ProposalError::Status {
                status: status.as_u16(),
                body,
            });
        }
    }
}

impl PhraseProposer for OllamaProposer {
    fn propose(&self, page_text: &str) -> Result<Vec<Phrase>, ProposalError> {
        let trimmed = page_text.trim();
        if trimmed.chars().count() < self.config.min_page_chars {
            tracing::debug!("page text too short, not sent to model");
            return Ok(Vec::new());
        }
        let prompt = build_prompt(truncate_chars(trimmed, self.config.max_input_chars));
        let reply = self.generate(&prompt)?;
        parse_phrase_response(&reply)
    }
}

/// Delay before retry number `attempt` (0-based): `base · 2^attempt`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// The longest prefix of `text` with at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Prompt asking for verbatim excerpts worth highlighting.
pub fn build_prompt(page_text: &str) -> String {
    format!(
        r#"Analyze the following text from one page of a document.
Identify the 3-5 most important sentences, definitions, or key takeaways that a reader reviewing this material should have highlighted.

Copy every excerpt EXACTLY as it appears in the text. Do not paraphrase, do not change punctuation or capitalization, and do not join text from different places.

Return JSON of the form {{"highlights": [{{"phrase": "exact excerpt", "details": "why it matters"}}]}}.

Text:
"""
{page_text}
""""#
    )
}
