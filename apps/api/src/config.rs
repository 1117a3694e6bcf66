use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::cache::DEFAULT_TTL_HOURS;
use crate::llm_client::ProviderKind;

/// Upper bound for `CACHE_TTL_HOURS` (ten years).
const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 10;

/// Application configuration loaded from environment variables.
/// Every variable has a default; provider keys are optional.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub deepseek_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub default_provider: ProviderKind,
    pub cache_dir: PathBuf,
    pub cache_ttl_hours: i64,
    pub llm_timeout_secs: u64,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            port: parse_or(&var, "PORT", 8080)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            deepseek_api_key: var("DEEPSEEK_API_KEY"),
            openai_api_key: var("OPENAI_API_KEY"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            gemini_api_key: var("GEMINI_API_KEY"),
            default_provider: parse_or(&var, "DEFAULT_PROVIDER", ProviderKind::DeepSeek)?,
            cache_dir: var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cache")),
            cache_ttl_hours: in_range(
                "CACHE_TTL_HOURS",
                parse_or(&var, "CACHE_TTL_HOURS", DEFAULT_TTL_HOURS)?,
                1..=MAX_CACHE_TTL_HOURS,
            )?,
            llm_timeout_secs: parse_or(&var, "LLM_TIMEOUT_SECS", 30)?,
            llm_temperature: parse_or(&var, "LLM_TEMPERATURE", 0.4)?,
            llm_max_tokens: parse_or(&var, "LLM_MAX_TOKENS", 1500)?,
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
        })
    }

    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::DeepSeek => self.deepseek_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Environment variable '{key}' has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

fn in_range<T>(key: &str, value: T, range: RangeInclusive<T>) -> Result<T>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(anyhow!(
            "Environment variable '{key}' must be between {} and {}, got {value}",
            range.start(),
            range.end()
        ))
    }
}
