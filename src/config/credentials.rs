use crate::utils::error::{BenchError, Result};
use std::env;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Provider API keys. Either may be absent; a key is only required once a
/// model that needs it gets built.
#[derive(Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
    gemini_api_key: Option<String>,
}

impl Credentials {
    pub fn new(openai_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.filter(|k| !k.trim().is_empty()),
            gemini_api_key: gemini_api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Loads `.env` from the working directory (if any) and reads the keys
    /// from the process environment. Variables already set take precedence.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }

        Self::new(env::var(OPENAI_API_KEY).ok(), env::var(GEMINI_API_KEY).ok())
    }

    pub fn openai(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| BenchError::MissingCredentialError {
                var: OPENAI_API_KEY.to_string(),
            })
    }

    pub fn gemini(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| BenchError::MissingCredentialError {
                var: GEMINI_API_KEY.to_string(),
            })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
