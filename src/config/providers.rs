use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4.1-2025-04-14";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Connection settings for one LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout_seconds: default_timeout_seconds(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    pub fn openai() -> Self {
        Self::new(OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL)
    }

    pub fn gemini() -> Self {
        Self::new(GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn validate_as(&self, section: &str) -> Result<()> {
        validate_url(&format!("{}.base_url", section), &self.base_url)?;
        validate_non_empty_string(&format!("{}.model", section), &self.model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,
    #[serde(default = "ProviderConfig::gemini")]
    pub gemini: ProviderConfig,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai(),
            gemini: ProviderConfig::gemini(),
        }
    }
}

impl Validate for ProviderSettings {
    fn validate(&self) -> Result<()> {
        self.openai.validate_as("providers.openai")?;
        self.gemini.validate_as("providers.gemini")
    }
}
