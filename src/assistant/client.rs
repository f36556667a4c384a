use crate::config::AssistantConfig;
use crate::error::AssistantError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

const SYSTEM_PROMPT: &str = "You are an expert programming assistant. \
    Provide clear, concise, and practical answers with code examples when appropriate.";

const INSTRUCTION_LINE: &str = "Please provide a clear explanation and code example.";

pub const SUPPORTED_LANGUAGES: [&str; 10] = [
    "python", "javascript", "java", "c++", "c#", "php", "ruby", "swift", "go", "rust",
];

pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES
        .iter()
        .any(|l| l.eq_ignore_ascii_case(language))
}

/// Outcome of a successful completion call.
#[derive(Debug, Clone)]
pub struct AssistReply {
    pub response: String,
    pub tokens_used: i32,
    pub response_time: f64,
    pub model: String,
}

/// Seam between the handlers and the external completion API; injected into
/// `AppState` so tests can substitute a stub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn process(
        &self,
        query: &str,
        code_context: &str,
        language: &str,
    ) -> Result<AssistReply, AssistantError>;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// One blocking round-trip per request: no retry, no timeout override, no
/// circuit breaking.
pub struct CodeAssistant {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl CodeAssistant {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Prompt lines in fixed order: language, optional context, question,
/// instruction. An empty context is dropped entirely, not left blank.
pub fn build_prompt(query: &str, code_context: &str, language: &str) -> String {
    let mut parts = vec![format!("Language: {}", language)];
    if !code_context.is_empty() {
        parts.push(format!("Code Context: {}", code_context));
    }
    parts.push(format!("Question: {}", query));
    parts.push(INSTRUCTION_LINE.to_string());
    parts.join("\n")
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    n: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: i32,
}

#[async_trait]
impl Assistant for CodeAssistant {
    async fn process(
        &self,
        query: &str,
        code_context: &str,
        language: &str,
    ) -> Result<AssistReply, AssistantError> {
        if query.trim().is_empty() {
            return Err(AssistantError::QueryRequired);
        }

        let prompt = build_prompt(query, code_context, language);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            n: 1,
        };

        debug!("Sending completion request for language: {}", language);
        let started = Instant::now();

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion API request failed: {}", e);
                AssistantError::Unexpected(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Completion API returned {}: {}", status, detail);
            return Err(match status {
                StatusCode::UNAUTHORIZED => AssistantError::InvalidApiKey,
                StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimited,
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    AssistantError::InvalidRequest(detail)
                }
                _ => AssistantError::Unexpected(format!("Completion API returned {}", status)),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Unexpected(format!("Invalid completion response: {}", e)))?;

        let response_time = started.elapsed().as_secs_f64();
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Unexpected("No completion choices returned".into()))?;
        let tokens_used = body.usage.map(|u| u.total_tokens).unwrap_or(0);

        debug!(
            "Completion API responded in {:.2}s, {} tokens used",
            response_time, tokens_used
        );

        Ok(AssistReply {
            response: choice.message.content.trim().to_string(),
            tokens_used,
            response_time,
            model: self.model.clone(),
        })
    }
}
