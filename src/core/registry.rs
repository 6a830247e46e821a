use crate::app::models::{AlwaysSkipModel, GeminiModel, OpenAiModel};
use crate::config::{Credentials, ProviderSettings};
use crate::domain::ports::ActionModel;
use crate::utils::error::{BenchError, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub const ALWAYS_SKIP: &str = "always-skip";
pub const GPT_4_1: &str = "gpt-4.1";
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";

/// Maps the model names used in scenarios to action model instances.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn ActionModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline model plus one model per provider whose credential is
    /// present.
    pub fn with_defaults(credentials: &Credentials, providers: &ProviderSettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(ALWAYS_SKIP, AlwaysSkipModel);

        if let Ok(key) = credentials.openai() {
            registry.register(GPT_4_1, OpenAiModel::new(key, providers.openai.clone())?);
        }
        if let Ok(key) = credentials.gemini() {
            registry.register(GEMINI_FLASH, GeminiModel::new(key, providers.gemini.clone())?);
        }

        tracing::debug!("Registered models: {:?}", registry.names());
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, model: impl ActionModel + 'static) {
        self.register_arc(name, Arc::new(model));
    }

    pub fn register_arc(&mut self, name: impl Into<String>, model: Arc<dyn ActionModel>) {
        self.models.insert(name.into(), model);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionModel>> {
        self.models.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Like [`get`](Self::get) but with an error that says what is available
    /// and, for the provider-backed names, which credential is missing.
    pub fn require(&self, name: &str) -> Result<Arc<dyn ActionModel>> {
        if let Some(model) = self.get(name) {
            return Ok(model);
        }

        match name {
            GPT_4_1 => Err(BenchError::MissingCredentialError {
                var: crate::config::credentials::OPENAI_API_KEY.to_string(),
            }),
            GEMINI_FLASH => Err(BenchError::MissingCredentialError {
                var: crate::config::credentials::GEMINI_API_KEY.to_string(),
            }),
            _ => Err(BenchError::UnsupportedModelError {
                model: name.to_string(),
                available: self.names(),
            }),
        }
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}
