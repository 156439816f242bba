//! Phrase proposers: the collaborator that picks what to highlight.
//!
//! A [`PhraseProposer`] receives one page's flattened text and returns the
//! phrases worth highlighting. The engine treats it as an opaque capability;
//! [`FixedPhrases`] and plain closures cover tests and scripted use, and
//! `OllamaProposer` (feature `ollama`) asks a local model.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// A phrase proposed for highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phrase {
    /// Text expected to occur verbatim on the page.
    pub text: String,
    /// Why the phrase matters, if the proposer said.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub details: Option<String>,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&str> for Phrase {
    fn from(text: &str) -> Self {
        Phrase::new(text)
    }
}

impl From<String> for Phrase {
    fn from(text: String) -> Self {
        Phrase::new(text)
    }
}

/// Errors a proposer may return. All of them are non-fatal to a run.
#[derive(Debug, Error)]
pub enum ProposalError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be read as a phrase list.
    #[error("malformed proposal: {0}")]
    Malformed(String),

    /// The proposer is not available (misconfigured or disabled).
    #[error("proposer unavailable: {0}")]
    Unavailable(String),
}

impl ProposalError {
    /// Whether the failure came from the shape of the response.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProposalError::Malformed(_))
    }
}

/// Proposes phrases to highlight on a page.
///
/// Implementations may block. They must be shareable across threads so a
/// run can be driven from a worker thread.
pub trait PhraseProposer: Send + Sync {
    /// Phrases for the page whose flattened text is `page_text`.
    fn propose(&self, page_text: &str) -> Result<Vec<Phrase>, ProposalError>;
}

impl<F> PhraseProposer for F
where
    F: Fn(&str) -> Result<Vec<Phrase>, ProposalError> + Send + Sync,
{
    fn propose(&self, page_text: &str) -> Result<Vec<Phrase>, ProposalError> {
        self(page_text)
    }
}

/// Proposes the same phrases for every page.
#[derive(Debug, Clone, Default)]
pub struct FixedPhrases {
    phrases: Vec<Phrase>,
}

impl FixedPhrases {
    pub fn new<I, P>(phrases: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Phrase>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }
}

impl PhraseProposer for FixedPhrases {
    fn propose(&self, _page_text: &str) -> Result<Vec<Phrase>, ProposalError> {
        Ok(self.phrases.clone())
    }
}

static CODE_FENCE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn get_code_fence_regex() -> Option<&'static Regex> {
    CODE_FENCE_REGEX
        .get_or_init(|| Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").ok())
        .as_ref()
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    get_code_fence_regex()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
}

/// Parse a model's reply into phrases.
///
/// Accepts, optionally inside a Markdown code fence:
/// - `["phrase", ...]`
/// - `[{"phrase": "...", "details": "..."}, ...]`
/// - `{"highlights": [...]}` or `{"phrases": [...]}` holding either list
///
/// Empty phrases are dropped.
///
/// # Errors
///
/// Returns [`ProposalError::Malformed`] for invalid JSON, any other
/// top-level shape, or an entry that is neither a string nor an object
/// with a string `phrase`.
pub fn parse_phrase_response(raw: &str) -> Result<Vec<Phrase>, ProposalError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProposalError::Malformed(format!("invalid JSON: {e}")))?;

    let entries = match &value {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("highlights").or_else(|| map.get("phrases")) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ProposalError::Malformed(
                    "expected a \"highlights\" or \"phrases\" array".to_string(),
                ));
            }
        },
        other => {
            return Err(ProposalError::Malformed(format!(
                "expected an array or object, got {}",
                json_kind(other)
            )));
        }
    };

    let mut phrases = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let phrase = match entry {
            Value::String(text) => Phrase::new(text.as_str()),
            Value::Object(map) => {
                let Some(Value::String(text)) = map.get("phrase") else {
                    return Err(ProposalError::Malformed(format!(
                        "entry {i} has no string \"phrase\""
                    )));
                };
                Phrase {
                    text: text.clone(),
                    details: map
                        .get("details")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                }
            }
            other => {
                return Err(ProposalError::Malformed(format!(
                    "entry {i} is {}, expected a string or object",
                    json_kind(other)
                )));
            }
        };
        if !phrase.text.is_empty() {
            phrases.push(phrase);
        }
    }
    Ok(phrases)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Drop repeated phrase texts, keeping the first occurrence of each.
pub fn dedupe_phrases(phrases: Vec<Phrase>) -> Vec<Phrase> {
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .filter(|p| seen.insert(p.text.clone()))
        .collect()
}
