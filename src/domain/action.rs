use serde::{Deserialize, Serialize};

/// A move an agent can make on its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Speak { message: String },
    Give { target: String, amount: i64 },
    Take { target: String, amount: i64 },
    SkipTurn,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Speak { .. } => "speak",
            Action::Give { .. } => "give",
            Action::Take { .. } => "take",
            Action::SkipTurn => "skip_turn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub reasoning: String,
    pub action: Action,
}

impl Decision {
    pub fn new(reasoning: impl Into<String>, action: Action) -> Self {
        Self {
            reasoning: reasoning.into(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parses_tagged_action() {
        let decision: Decision = serde_json::from_str(
            r#"{"reasoning": "share", "action": {"action": "give", "target": "agent_1", "amount": 50}}"#,
        )
        .unwrap();

        assert_eq!(
            decision.action,
            Action::Give {
                target: "agent_1".to_string(),
                amount: 50
            }
        );
    }

    #[test]
    fn test_skip_turn_has_no_params() {
        let json = serde_json::to_value(Action::SkipTurn).unwrap();
        assert_eq!(json, serde_json::json!({"action": "skip_turn"}));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let parsed: Result<Action, _> = serde_json::from_str(r#"{"action": "steal"}"#);
        assert!(parsed.is_err());
    }
}
