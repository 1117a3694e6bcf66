//! OpenAI-compatible chat completions (OpenAI, DeepSeek).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::{success_body, CompletionOptions, CompletionProvider, LlmError};

pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: Client,
    name: &'static str,
    url: String,
    model: String,
    api_key: String,
    options: CompletionOptions,
}

impl OpenAiCompatProvider {
    pub fn new(
        client: Client,
        name: &'static str,
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: String,
        options: CompletionOptions,
    ) -> Self {
        Self {
            client,
            name,
            url: url.into(),
            model: model.into(),
            api_key,
            options,
        }
    }

    pub fn deepseek(client: Client, api_key: String, options: CompletionOptions) -> Self {
        Self::new(client, "deepseek", DEEPSEEK_API_URL, DEEPSEEK_MODEL, api_key, options)
    }

    pub fn openai(client: Client, api_key: String, options: CompletionOptions) -> Self {
        Self::new(client, "openai", OPENAI_API_URL, OPENAI_MODEL, api_key, options)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        debug!("Calling {} chat completions with model {}", self.name, self.model);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let text = success_body(response).await?;

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::MalformedBody(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| {
                LlmError::MalformedBody("missing choices[0].message.content".to_string())
            })?;

        if content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(content)
    }
}
