use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing credential: {var} is not set")]
    MissingCredentialError { var: String },

    #[error("Agent model '{model}' not supported. Please register model or use one of {available:?}")]
    UnsupportedModelError {
        model: String,
        available: Vec<String>,
    },

    #[error("Agent '{agent_id}' not among alive agents in env")]
    UnknownAgentError { agent_id: String },

    #[error("{provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} produced an unusable response: {message}")]
    ModelOutputError { provider: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a binary that stops on an error of this
    /// severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl BenchError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BenchError::ApiError(_) => ErrorSeverity::Medium,
            BenchError::ProviderError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            BenchError::ProviderError { .. } => ErrorSeverity::High,
            BenchError::ModelOutputError { .. } => ErrorSeverity::Medium,
            BenchError::IoError(_) => ErrorSeverity::Critical,
            BenchError::SerializationError(_)
            | BenchError::ConfigValidationError { .. }
            | BenchError::InvalidConfigValueError { .. }
            | BenchError::MissingCredentialError { .. }
            | BenchError::UnsupportedModelError { .. }
            | BenchError::UnknownAgentError { .. } => ErrorSeverity::High,
        }
    }

    /// Whether a provider call that failed this way is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            BenchError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            BenchError::ProviderError { status, .. } => *status == 429 || *status >= 500,
            BenchError::ModelOutputError { .. } => true,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BenchError::ApiError(_) => "Check network connectivity and the provider base URL",
            BenchError::IoError(_) => "Check that the output directory is writable",
            BenchError::SerializationError(_) => "Check that the input files contain valid JSON",
            BenchError::ConfigValidationError { .. }
            | BenchError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
            BenchError::MissingCredentialError { .. } => {
                "Add OPENAI_API_KEY / GEMINI_API_KEY to the .env file at the project root"
            }
            BenchError::UnsupportedModelError { .. } => {
                "Use one of the registered model names or register a new model"
            }
            BenchError::UnknownAgentError { .. } => "Only living agents can be referenced by events",
            BenchError::ProviderError { status, .. } if *status == 401 || *status == 403 => {
                "Verify that the API key is valid for this provider"
            }
            BenchError::ProviderError { .. } => "Retry later or increase retry_attempts",
            BenchError::ModelOutputError { .. } => {
                "The model did not follow the response format; retry or pick another model"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BenchError::MissingCredentialError { var } => {
                format!("{} is required for the selected model but was not found", var)
            }
            BenchError::UnsupportedModelError { model, .. } => {
                format!("Unknown model '{}'", model)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
