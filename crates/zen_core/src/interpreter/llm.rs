//! HTTP client for the hosted language model.
//!
//! Three wire formats are spoken, picked from the API URL: Gemini
//! `generateContent` (the default endpoint), Anthropic messages, and the
//! OpenAI-compatible chat completions used by most other providers.

use super::prompt::{command_prompt, reply_instruction, system_instruction};
use super::{InterpretError, Interpreter, Responder, parse_descriptor};
use crate::config::Config;
use crate::locale::Language;
use crate::model::{CommandDescriptor, TaskContext};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Gemini,
    Anthropic,
    OpenAi,
}

impl ApiFormat {
    pub fn detect(url: &str) -> Self {
        if url.contains("generativelanguage.googleapis.com") {
            Self::Gemini
        } else if url.contains("anthropic.com") {
            Self::Anthropic
        } else {
            Self::OpenAi
        }
    }
}

pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = ApiFormat::detect(&api_url);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// `None` when no API key is present in the environment.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = crate::config::api_key_from_env()?;
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self::new(api_key, api_url, model))
    }

    pub fn api_format(&self) -> ApiFormat {
        self.api_format
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one system + user exchange and returns the text of the first
    /// candidate, or an empty string when the model produced none.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        want_json: bool,
    ) -> Result<String, InterpretError> {
        tracing::debug!(
            model = %self.model,
            format = ?self.api_format,
            "sending completion request"
        );
        match self.api_format {
            ApiFormat::Gemini => self.complete_gemini(system, user, want_json).await,
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAi => self.complete_openai(system, user).await,
        }
    }

    async fn complete_gemini(
        &self,
        system: &str,
        user: &str,
        want_json: bool,
    ) -> Result<String, InterpretError> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system.into() }],
            },
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart { text: user.into() }],
            }],
            generation_config: want_json.then(|| GenerationConfig {
                response_mime_type: "application/json".into(),
            }),
        };
        let url = format!(
            "{}/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InterpretError::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InterpretError::unavailable(format!("API error: {error_text}")));
        }

        let completion: GeminiResponse = response
            .json()
            .await
            .map_err(|e| InterpretError::malformed(e.to_string()))?;

        Ok(completion
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String, InterpretError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| InterpretError::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InterpretError::unavailable(format!("API error: {error_text}")));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| InterpretError::malformed(e.to_string()))?;

        Ok(completion
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .unwrap_or_default())
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String, InterpretError> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InterpretError::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InterpretError::unavailable(format!("API error: {error_text}")));
        }

        let completion: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| InterpretError::malformed(e.to_string()))?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Responder for LlmClient {
    async fn respond(&self, input: &str, language: Language) -> Result<String, InterpretError> {
        self.complete(&reply_instruction(language), input, false)
            .await
    }
}

/// Interpreter backed by the hosted model.
pub struct LlmInterpreter {
    client: LlmClient,
}

impl LlmInterpreter {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

#[async_trait]
impl Interpreter for LlmInterpreter {
    async fn interpret(
        &self,
        utterance: &str,
        context: &[TaskContext],
    ) -> Result<CommandDescriptor, InterpretError> {
        let user = command_prompt(utterance, context)
            .map_err(|err| InterpretError::malformed(err.to_string()))?;
        let response = self
            .client
            .complete(&system_instruction(), &user, true)
            .await?;
        parse_descriptor(&response)
    }
}

#[async_trait]
impl Responder for LlmInterpreter {
    async fn respond(&self, input: &str, language: Language) -> Result<String, InterpretError> {
        self.client.respond(input, language).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
