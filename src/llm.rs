//! Chat model access: message assembly, free-text and JSON-mode generation.
//!
//! The underlying completion call sits behind the [`ChatModel`] trait so
//! pipeline stages can run against a stub; [`OpenAiClient`] is the
//! production implementation over the chat-completions HTTP API.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Default chat model for every stage.
pub const DEFAULT_MODEL: &str = "gpt-5-nano";
/// Sampling temperature for creative prose output.
pub const DEFAULT_TEXT_TEMPERATURE: f32 = 0.7;
/// Lower default keeps JSON-mode replies stable.
pub const DEFAULT_JSON_TEMPERATURE: f32 = 0.2;

const JSON_ONLY_SYSTEM_PROMPT: &str =
    "You are a strict JSON responder. Reply with a single JSON object and nothing else.";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat roles recognized in conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling configuration for one model call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Defaults tuned for creative prose.
    pub fn text() -> Self {
        GenerationConfig {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEXT_TEMPERATURE,
            max_output_tokens: None,
        }
    }

    /// Defaults tuned for deterministic structured output.
    pub fn json() -> Self {
        GenerationConfig {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_JSON_TEMPERATURE,
            max_output_tokens: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Output constraint for one model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    /// Force the reply to be a single well-formed JSON object.
    JsonObject,
}

/// The underlying chat-completion call.
pub trait ChatModel {
    fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
        mode: OutputMode,
    ) -> Result<String>;
}

/// Merge existing conversation history with the latest user prompt.
///
/// History order is preserved; the new prompt lands last as a user message.
/// Entries with empty content are rejected up front rather than sent to the
/// service.
pub fn build_messages(prompt: &str, history: &[ChatMessage]) -> Result<Vec<ChatMessage>> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    for (index, message) in history.iter().enumerate() {
        if message.content.trim().is_empty() {
            return Err(Error::Schema(format!(
                "history entry {index} has empty content"
            )));
        }
        messages.push(message.clone());
    }
    messages.push(ChatMessage::user(prompt));
    Ok(messages)
}

/// Run a free-text completion and return the trimmed reply.
pub fn generate_text(
    model: &dyn ChatModel,
    prompt: &str,
    history: &[ChatMessage],
    config: &GenerationConfig,
) -> Result<String> {
    let messages = build_messages(prompt, history)?;
    let reply = model.complete(&messages, config, OutputMode::Text)?;
    Ok(reply.trim().to_string())
}

/// Run a JSON-mode completion and parse the reply into one JSON object.
pub fn generate_json(
    model: &dyn ChatModel,
    prompt: &str,
    history: &[ChatMessage],
    config: &GenerationConfig,
) -> Result<Value> {
    let raw = generate_json_text(model, prompt, history, config)?;
    parse_json_reply(&raw)
}

/// JSON-mode completion returning the raw reply text without parsing.
pub fn generate_json_text(
    model: &dyn ChatModel,
    prompt: &str,
    history: &[ChatMessage],
    config: &GenerationConfig,
) -> Result<String> {
    let mut messages = vec![ChatMessage::system(JSON_ONLY_SYSTEM_PROMPT)];
    messages.extend(build_messages(prompt, history)?);
    let reply = model.complete(&messages, config, OutputMode::JsonObject)?;
    Ok(reply.trim().to_string())
}

/// Parse a JSON-mode reply, attaching the raw text on failure so malformed
/// replies can be diagnosed from the error alone.
pub fn parse_json_reply(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|err| Error::ModelOutput {
        message: err.to_string(),
        raw: raw.to_string(),
    })
}

/// Chat-completions client for the OpenAI HTTP API.
pub struct OpenAiClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        OpenAiClient {
            agent,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Point the client at a compatible endpoint (local server, test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatModel for OpenAiClient {
    fn complete(
        &self,
        messages: &[ChatMessage],
        config: &GenerationConfig,
        mode: OutputMode,
    ) -> Result<String> {
        let mut body = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
        });
        if let Some(max) = config.max_output_tokens {
            body["max_completion_tokens"] = json!(max);
        }
        if mode == OutputMode::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.base_url);
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|err| Error::ExternalService {
                service: "model",
                message: err.to_string(),
            })?;
        let reply: ChatCompletionReply =
            response
                .body_mut()
                .read_json()
                .map_err(|err| Error::ExternalService {
                    service: "model",
                    message: format!("decode chat completion reply: {err}"),
                })?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::ExternalService {
                service: "model",
                message: "chat completion reply has no choices".to_string(),
            })?;
        tracing::info!(
            elapsed_ms,
            model = %config.model,
            reply_bytes = content.len(),
            "chat completion finished"
        );
        Ok(content)
    }
}
