use crate::app::models::schema::{decision_schema, parse_decision};
use crate::app::models::{ensure_success, http_client, read_json, with_retries};
use crate::config::ProviderConfig;
use crate::domain::model::{AgentObservation, Message};
use crate::domain::ports::{ActionModel, ModelTurn};
use crate::utils::error::{BenchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [Message],
    text: TextConfig,
}

#[derive(Debug, Serialize)]
struct TextConfig {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl ResponsesResponse {
    /// Text of the first `output_text` part of the first assistant message.
    fn output_text(&self) -> Result<&str> {
        let parts = self
            .output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter());

        for part in parts {
            match part.kind.as_str() {
                "output_text" => {
                    if let Some(text) = part.text.as_deref() {
                        return Ok(text);
                    }
                }
                "refusal" => {
                    return Err(BenchError::ModelOutputError {
                        provider: PROVIDER.to_string(),
                        message: format!(
                            "model refused: {}",
                            part.refusal.as_deref().unwrap_or_default()
                        ),
                    })
                }
                _ => {}
            }
        }

        Err(BenchError::ModelOutputError {
            provider: PROVIDER.to_string(),
            message: "A response was not generated by the model".to_string(),
        })
    }
}

/// Decides through the OpenAI Responses API with a strict JSON schema.
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    config: ProviderConfig,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config)?,
            api_key: api_key.into(),
            config,
        })
    }

    async fn request(&self, observation: &AgentObservation) -> Result<ModelTurn> {
        let body = ResponsesRequest {
            model: &self.config.model,
            input: &observation.messages,
            text: TextConfig {
                format: TextFormat {
                    kind: "json_schema",
                    name: "decision",
                    strict: true,
                    schema: decision_schema(),
                },
            },
        };

        tracing::debug!(
            "Requesting decision for {} from {} ({} messages)",
            observation.agent_id,
            self.config.model,
            observation.messages.len()
        );
        let response = self
            .client
            .post(self.config.endpoint("responses"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(PROVIDER, response).await?;

        let parsed: ResponsesResponse = read_json(PROVIDER, response).await?;
        let text = parsed.output_text()?;
        let decision = parse_decision(PROVIDER, text)?;

        Ok(ModelTurn::new(decision).with_message(Message::assistant(text)))
    }
}

#[async_trait]
impl ActionModel for OpenAiModel {
    async fn decide(&self, observation: &AgentObservation) -> Result<ModelTurn> {
        with_retries(PROVIDER, &self.config, || self.request(observation)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_skips_reasoning_items() {
        let response: ResponsesResponse = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "{\"reasoning\":\"r\",\"action\":{\"action\":\"skip_turn\"}}"}
                ]}
            ]
        }))
        .unwrap();

        assert!(response.output_text().unwrap().contains("skip_turn"));
    }

    #[test]
    fn test_refusal_is_model_output_error() {
        let response: ResponsesResponse = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "message", "content": [{"type": "refusal", "refusal": "no"}]}
            ]
        }))
        .unwrap();

        let err = response.output_text().unwrap_err();
        assert!(matches!(err, BenchError::ModelOutputError { .. }));
    }

    #[test]
    fn test_empty_output_is_error() {
        let response: ResponsesResponse =
            serde_json::from_value(serde_json::json!({"output": []})).unwrap();
        assert!(response.output_text().is_err());
    }
}
