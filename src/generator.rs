//! External text-generation backend used by [`crate::llm_agent::LlmAgent`].
//!
//! [`HttpGenerator`] talks to an OpenAI-compatible chat completions endpoint,
//! non-streaming: one request, one parsed response. Every call pulls its API key from a
//! [`KeyManager`] and reports the outcome back to it.

use crate::error::{Error, Result};
use crate::key_manager::KeyManager;
use crate::retry::{retry_with_policy_conditional, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-call generation knobs.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_mime_type: Option<String>,
    pub response_schema: Option<serde_json::Value>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
            response_mime_type: None,
            response_schema: None,
        }
    }
}

/// The result of one generation call.
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    pub text: String,
    pub processing_time_secs: f64,
}

/// A backend capable of turning a prompt (plus optional system instruction
/// and config) into text. [`HttpGenerator`] is the only production
/// implementation; tests use hand-written fakes.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        config: &GenerationConfig,
    ) -> Result<GeneratedResponse>;
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatResponseChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

/// Non-streaming OpenAI-compatible chat completions client: one request in,
/// one parsed response out.
pub struct HttpGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    keys: Arc<KeyManager>,
    retry_policy: RetryPolicy,
}

impl HttpGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, keys: Arc<KeyManager>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build().map_err(Error::Http)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            keys,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn call_once(&self, prompt: &str, system_instruction: Option<&str>, config: &GenerationConfig) -> Result<GeneratedResponse> {
        let key = self.keys.get_available_key()?;
        let start = Instant::now();

        let mut messages = Vec::new();
        if let Some(system) = system_instruction {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let response_format = if config.response_mime_type.as_deref() == Some("application/json") {
            Some(match &config.response_schema {
                Some(schema) => serde_json::json!({ "type": "json_schema", "json_schema": schema }),
                None => serde_json::json!({ "type": "json_object" }),
            })
        } else {
            None
        };

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            response_format,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let result = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.keys.report_error(&key);
                return Err(Error::Http(err));
            }
        };

        if !response.status().is_success() {
            self.keys.report_error(&key);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::processing_failed(format!("generator request failed ({status}): {body}")));
        }

        let body_bytes = response.bytes().await.map_err(|err| {
            self.keys.report_error(&key);
            Error::Http(err)
        })?;
        self.keys.report_success(&key, body_bytes.len() as u64);

        let parsed: ChatResponse = serde_json::from_slice(&body_bytes)?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::processing_failed("generator returned no text"));
        }

        Ok(GeneratedResponse {
            text,
            processing_time_secs: start.elapsed().as_secs_f64(),
        })
    }
}

#[async_trait::async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str, system_instruction: Option<&str>, config: &GenerationConfig) -> Result<GeneratedResponse> {
        retry_with_policy_conditional(&self.retry_policy, |_attempt| self.call_once(prompt, system_instruction, config)).await
    }
}
