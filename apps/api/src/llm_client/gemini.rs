//! Google Gemini `generateContent`. The key travels in the `x-goog-api-key`
//! header, never in the URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::llm_client::{success_body, CompletionOptions, CompletionProvider, LlmError};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    options: CompletionOptions,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: String, options: CompletionOptions) -> Self {
        Self::with_base_url(client, GEMINI_API_BASE, api_key, options)
    }

    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        api_key: String,
        options: CompletionOptions,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            options,
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{GEMINI_MODEL}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        let body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.options.temperature,
                "maxOutputTokens": self.options.max_tokens,
            },
        });

        debug!("Calling Gemini with model {GEMINI_MODEL}");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let text = success_body(response).await?;

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::MalformedBody(e.to_string()))?;
        let parts = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or_else(|| LlmError::MalformedBody("missing candidates[0].content".to_string()))?;

        let reply: String = parts.into_iter().filter_map(|p| p.text).collect();
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(reply)
    }
}
