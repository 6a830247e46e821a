use crate::app::models::schema::{flat_decision_schema, FlatDecision};
use crate::app::models::{ensure_success, http_client, read_json, with_retries};
use crate::config::ProviderConfig;
use crate::domain::model::{AgentObservation, Message, Role};
use crate::domain::ports::{ActionModel, ModelTurn};
use crate::utils::error::{BenchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Gemini";
const TURN_PROMPT: &str = "from system: It is your turn. Choose your action.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Maps a transcript onto Gemini's shape: system messages go to the system
/// instruction, assistant turns become `model` turns and consecutive turns of
/// the same role are merged.
fn build_contents(messages: &[Message]) -> (Option<Content>, Vec<Content>) {
    let mut system_parts = Vec::new();
    let mut contents: Vec<Content> = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::System => {
                system_parts.push(Part {
                    text: message.content.clone(),
                });
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };
        let part = Part {
            text: message.content.clone(),
        };

        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => last.parts.push(part),
            _ => contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![part],
            }),
        }
    }

    if contents.last().and_then(|c| c.role.as_deref()) != Some("user") {
        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: TURN_PROMPT.to_string(),
            }],
        });
    }

    let system_instruction = (!system_parts.is_empty()).then(|| Content {
        role: None,
        parts: system_parts,
    });
    (system_instruction, contents)
}

impl GenerateContentResponse {
    fn text(&self) -> Result<String> {
        let Some(candidate) = self.candidates.first() else {
            return Err(BenchError::ModelOutputError {
                provider: PROVIDER.to_string(),
                message: match &self.prompt_feedback {
                    Some(feedback) => format!("no candidates, prompt feedback: {}", feedback),
                    None => "A response was not generated by the model".to_string(),
                },
            });
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(BenchError::ModelOutputError {
                provider: PROVIDER.to_string(),
                message: format!(
                    "empty candidate (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }
        Ok(text)
    }
}

/// Decides through the Gemini `generateContent` API in JSON mode.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    config: ProviderConfig,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            config,
        })
    }

    async fn request(&self, observation: &AgentObservation) -> Result<ModelTurn> {
        let (system_instruction, contents) = build_contents(&observation.messages);
        let body = GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: flat_decision_schema(),
            },
        };

        let url = self
            .config
            .endpoint(&format!("v1beta/models/{}:generateContent", self.config.model));
        tracing::debug!(
            "Requesting decision for {} from {}",
            observation.agent_id,
            self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(PROVIDER, response).await?;

        let parsed: GenerateContentResponse = read_json(PROVIDER, response).await?;
        let text = parsed.text()?;
        let flat: FlatDecision =
            serde_json::from_str(&text).map_err(|e| BenchError::ModelOutputError {
                provider: PROVIDER.to_string(),
                message: format!("invalid decision JSON: {}", e),
            })?;
        let decision = flat.into_decision(PROVIDER)?;

        Ok(ModelTurn::new(decision).with_message(Message::assistant(text)))
    }
}

#[async_trait]
impl ActionModel for GeminiModel {
    async fn decide(&self, observation: &AgentObservation) -> Result<ModelTurn> {
        with_retries(PROVIDER, &self.config, || self.request(observation)).await
    }
}
