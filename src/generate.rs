//! Content generation
//!
//! The generator receives an instruction built from the prompt template and
//! the source text of the section to fix, and returns replacement text. The
//! pipeline only depends on the [`ContentGenerator`] trait.

use std::path::Path;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SERVICE: &str = "content generator";

/// Built-in instruction template
pub const DEFAULT_PROMPT: &str = "\
You maintain technical documentation written in Markdown.

{{user}} reported a problem with the document at `{{path}}`:

{{issue}}

The text below is the section \"{{heading}}\" of that document. Rewrite it so \
the problem is fixed. Keep the heading line, the heading depth and the \
existing style. Change nothing that the report does not call for. Answer with \
the rewritten Markdown only, without commentary.";

/// Produces replacement text for a section
pub trait ContentGenerator: Send + Sync {
    /// Generate replacement text for `source`, following `instruction`.
    ///
    /// An empty answer is returned as-is; the caller rejects it.
    fn generate(&self, instruction: &str, source: &str) -> Result<String>;
}

/// Values substituted into the prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub path: &'a str,
    pub issue: &'a str,
    pub heading: &'a str,
    pub user: &'a str,
}

/// Instruction template with `{{path}}`, `{{issue}}`, `{{heading}}` and
/// `{{user}}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Read a template from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)?;
        if template.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("prompt template {} is empty", path.display()),
                hint: Some("Remove generator.prompt_template to use the built-in prompt".to_string()),
            });
        }
        Ok(Self::new(template))
    }

    /// Substitute the known placeholders; unknown ones are left untouched.
    pub fn render(&self, context: &PromptContext<'_>) -> String {
        let heading = if context.heading.is_empty() {
            "(whole document)"
        } else {
            context.heading
        };
        self.template
            .replace("{{path}}", context.path)
            .replace("{{issue}}", context.issue)
            .replace("{{heading}}", heading)
            .replace("{{user}}", context.user)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Generator backed by an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsGenerator {
    /// Create a generator with connect and total timeouts.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .user_agent(concat!("fixdoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::upstream(SERVICE, format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

impl ContentGenerator for ChatCompletionsGenerator {
    fn generate(&self, instruction: &str, source: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: source,
                },
            ],
            temperature: 0.2,
        };

        debug!("Requesting replacement from {} ({})", self.endpoint, self.model);
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                SERVICE,
                format!(
                    "HTTP {} - {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown error")
                ),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::upstream(SERVICE, format!("unreadable response: {e}")))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Generator that always answers with the same text
///
/// Used when the replacement is supplied up front (`fixdoc fix
/// --replacement-file`) and in tests.
#[derive(Debug, Clone)]
pub struct FixedGenerator(pub String);

impl ContentGenerator for FixedGenerator {
    fn generate(&self, _instruction: &str, _source: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
