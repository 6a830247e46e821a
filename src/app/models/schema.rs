//! Response schemas handed to the providers' structured-output modes.

use crate::domain::action::{Action, Decision};
use crate::utils::error::{BenchError, Result};
use serde::Deserialize;
use serde_json::{json, Value};

fn variant(action: &str, params: &[(&str, &str)]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("action".to_string(), json!({"type": "string", "enum": [action]}));
    let mut required = vec![json!("action")];
    for (name, kind) in params {
        properties.insert(name.to_string(), json!({ "type": kind }));
        required.push(json!(name));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Strict JSON Schema for [`Decision`], one `anyOf` branch per action.
pub fn decision_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reasoning": {"type": "string"},
            "action": {
                "anyOf": [
                    variant("speak", &[("message", "string")]),
                    variant("give", &[("target", "string"), ("amount", "integer")]),
                    variant("take", &[("target", "string"), ("amount", "integer")]),
                    variant("skip_turn", &[]),
                ]
            }
        },
        "required": ["reasoning", "action"],
        "additionalProperties": false,
    })
}

/// Single-object form of [`Decision`] for providers whose schema dialect has
/// no unions. Parameters that do not apply to the chosen action are null.
pub fn flat_decision_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "reasoning": {"type": "STRING"},
            "action": {"type": "STRING", "enum": ["speak", "give", "take", "skip_turn"]},
            "message": {"type": "STRING", "nullable": true},
            "target": {"type": "STRING", "nullable": true},
            "amount": {"type": "INTEGER", "nullable": true},
        },
        "required": ["reasoning", "action"],
        "propertyOrdering": ["reasoning", "action", "message", "target", "amount"],
    })
}

#[derive(Debug, Deserialize)]
pub struct FlatDecision {
    pub reasoning: String,
    pub action: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl FlatDecision {
    pub fn into_decision(self, provider: &str) -> Result<Decision> {
        let missing = |field: &str| BenchError::ModelOutputError {
            provider: provider.to_string(),
            message: format!("action '{}' requires '{}'", self.action, field),
        };

        let action = match self.action.as_str() {
            "speak" => Action::Speak {
                message: self.message.clone().ok_or_else(|| missing("message"))?,
            },
            "give" => Action::Give {
                target: self.target.clone().ok_or_else(|| missing("target"))?,
                amount: self.amount.ok_or_else(|| missing("amount"))?,
            },
            "take" => Action::Take {
                target: self.target.clone().ok_or_else(|| missing("target"))?,
                amount: self.amount.ok_or_else(|| missing("amount"))?,
            },
            "skip_turn" => Action::SkipTurn,
            other => {
                return Err(BenchError::ModelOutputError {
                    provider: provider.to_string(),
                    message: format!("Action '{}' not recognized", other),
                })
            }
        };

        Ok(Decision::new(self.reasoning, action))
    }
}

/// Parses a model's JSON text into a [`Decision`].
pub fn parse_decision(provider: &str, text: &str) -> Result<Decision> {
    serde_json::from_str(text).map_err(|e| BenchError::ModelOutputError {
        provider: provider.to_string(),
        message: format!("invalid decision JSON: {}", e),
    })
}
