//! Every outbound completion call goes through a [`CompletionProvider`] held
//! by the [`ProviderRegistry`].
//!
//! One implementation per provider API, selected per request by name. Calls are
//! bounded by a single client-wide timeout and are never retried.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppError;

pub mod anthropic;
pub mod gemini;
pub mod openai_compat;
pub mod prompts;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for LlmError {
    // URLs are dropped: some providers carry credentials in the query string.
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e.without_url())
        }
    }
}

/// Sampling settings shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 1500,
        }
    }
}

/// Capability interface for a chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sends one prompt and returns the model's text reply.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    DeepSeek,
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::DeepSeek,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn env_key(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown provider '{}'. Expected one of: deepseek, openai, anthropic, gemini",
                    s.trim()
                )
            })
    }
}

/// Builds the single HTTP client shared by all providers.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Returns the response body when the status is 2xx, an `Api` error otherwise.
pub(crate) async fn success_body(response: Response) -> Result<String, LlmError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

/// Configured providers, keyed by kind, plus the default used when a request
/// does not name one.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn CompletionProvider>>,
    default: ProviderKind,
}

impl ProviderRegistry {
    pub fn new(default: ProviderKind) -> Self {
        Self {
            providers: HashMap::new(),
            default,
        }
    }

    /// Registers one provider per API key present in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(config.llm_timeout_secs))?;
        let options = CompletionOptions {
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        };

        let mut registry = Self::new(config.default_provider);
        for kind in ProviderKind::ALL {
            let Some(api_key) = config.api_key(kind) else {
                continue;
            };
            let api_key = api_key.to_string();
            let provider: Arc<dyn CompletionProvider> = match kind {
                ProviderKind::DeepSeek => {
                    Arc::new(OpenAiCompatProvider::deepseek(client.clone(), api_key, options))
                }
                ProviderKind::OpenAi => {
                    Arc::new(OpenAiCompatProvider::openai(client.clone(), api_key, options))
                }
                ProviderKind::Anthropic => {
                    Arc::new(AnthropicProvider::new(client.clone(), api_key, options))
                }
                ProviderKind::Gemini => {
                    Arc::new(GeminiProvider::new(client.clone(), api_key, options))
                }
            };
            info!("LLM provider '{kind}' enabled");
            registry = registry.with_provider(kind, provider);
        }
        Ok(registry)
    }

    pub fn with_provider(
        mut self,
        kind: ProviderKind,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    pub fn default_kind(&self) -> ProviderKind {
        self.default
    }

    /// Picks the provider named in a request, or the default one.
    ///
    /// Unknown names are a validation error; a known provider without an API
    /// key is a configuration error.
    pub fn resolve(
        &self,
        requested: Option<&str>,
    ) -> Result<Arc<dyn CompletionProvider>, AppError> {
        let kind = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.parse::<ProviderKind>().map_err(AppError::Validation)?,
            None => self.default,
        };
        debug!("Resolving LLM provider '{kind}'");
        self.providers.get(&kind).cloned().ok_or_else(|| {
            AppError::Config(format!(
                "{} API key not configured (set {})",
                kind.display_name(),
                kind.env_key()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(prompt.to_string())
        }
    }

    #[test]
    fn test_provider_kind_parses_case_insensitively() {
        assert_eq!("DeepSeek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert_eq!(" openai ".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("GEMINI".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("llama".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_display_round_trips() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_resolve_defaults_when_no_name_given() {
        let registry = ProviderRegistry::new(ProviderKind::DeepSeek)
            .with_provider(ProviderKind::DeepSeek, Arc::new(Echo));
        let provider = registry.resolve(None).unwrap();
        assert_eq!(provider.name(), "echo");
        assert_eq!(provider.complete("hi", "").await.unwrap(), "hi");
        assert!(registry.resolve(Some("  ")).is_ok());
    }

    #[test]
    fn test_resolve_missing_key_is_config_error() {
        let registry = ProviderRegistry::new(ProviderKind::DeepSeek);
        match registry.resolve(Some("openai")) {
            Err(AppError::Config(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("expected config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_from_config_registers_only_keyed_providers() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".to_string()),
            "GEMINI_API_KEY" => Some("g-key".to_string()),
            "DEFAULT_PROVIDER" => Some("gemini".to_string()),
            _ => None,
        })
        .unwrap();
        let registry = ProviderRegistry::from_config(&config).unwrap();

        assert_eq!(registry.default_kind(), ProviderKind::Gemini);
        assert_eq!(registry.resolve(None).unwrap().name(), "gemini");
        assert_eq!(registry.resolve(Some("OpenAI")).unwrap().name(), "openai");
        assert!(matches!(registry.resolve(Some("deepseek")), Err(AppError::Config(_))));
        assert!(matches!(registry.resolve(Some("anthropic")), Err(AppError::Config(_))));
    }

    #[test]
    fn test_resolve_unknown_name_is_validation_error() {
        let registry = ProviderRegistry::new(ProviderKind::DeepSeek);
        assert!(matches!(
            registry.resolve(Some("mystery")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_api_error_message_includes_status() {
        let err = LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }
}
