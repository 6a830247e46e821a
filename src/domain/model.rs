use crate::utils::error::{BenchError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative, validate_positive_number, validate_unique,
    Validate,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry in an agent's conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Notification from the environment itself.
    pub fn from_system(content: impl AsRef<str>) -> Self {
        Self::user(format!("from system: {}", content.as_ref()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Alive,
    Deceased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: String,
    pub energy: i64,
    pub model: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl AgentState {
    pub fn new(id: impl Into<String>, energy: i64, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            energy,
            model: model.into(),
            status: AgentStatus::Alive,
            messages: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == AgentStatus::Alive
    }

    pub fn notify(&mut self, message: Message) {
        self.messages.push(message);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvState {
    pub available_energy: i64,
    pub agents: Vec<AgentState>,
    pub n_rounds: u32,
    pub energy_usage_rate: i64,
    pub receiver_agent: String,
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub current_agent_idx: usize,
}

impl EnvState {
    pub fn agent(&self, agent_id: &str) -> Option<&AgentState> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    pub fn agent_mut(&mut self, agent_id: &str) -> Option<&mut AgentState> {
        self.agents.iter_mut().find(|a| a.id == agent_id)
    }

    /// Living agent by id; `None` for unknown and deceased agents alike.
    pub fn alive_agent_mut(&mut self, agent_id: &str) -> Option<&mut AgentState> {
        self.agent_mut(agent_id).filter(|a| a.is_alive())
    }

    pub fn is_alive(&self, agent_id: &str) -> bool {
        self.agent(agent_id).map(AgentState::is_alive).unwrap_or(false)
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.iter().filter(|a| a.is_alive())
    }

    pub fn alive_agents_mut(&mut self) -> impl Iterator<Item = &mut AgentState> {
        self.agents.iter_mut().filter(|a| a.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.n_rounds.saturating_sub(self.current_round)
    }

    pub fn group_order(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id.as_str()).collect()
    }
}

impl Validate for EnvState {
    fn validate(&self) -> Result<()> {
        validate_positive_number("n_rounds", self.n_rounds as usize, 1)?;
        validate_non_negative("energy_usage_rate", self.energy_usage_rate)?;
        validate_non_negative("available_energy", self.available_energy)?;
        validate_positive_number("agents", self.agents.len(), 1)?;

        for agent in &self.agents {
            validate_non_empty_string("agents.id", &agent.id)?;
            validate_non_empty_string("agents.model", &agent.model)?;
        }
        validate_unique("agents.id", self.agents.iter().map(|a| a.id.as_str()))?;

        if self.agent(&self.receiver_agent).is_none() {
            return Err(BenchError::InvalidConfigValueError {
                field: "receiver_agent".to_string(),
                value: self.receiver_agent.clone(),
                reason: "Receiver must be one of the agents".to_string(),
            });
        }

        Ok(())
    }
}

/// What an action model gets to see when it is asked for a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentObservation {
    pub agent_id: String,
    pub energy: i64,
    pub messages: Vec<Message>,
}

impl AgentObservation {
    pub fn from_state(agent: &AgentState) -> Self {
        Self {
            agent_id: agent.id.clone(),
            energy: agent.energy,
            messages: agent.messages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> EnvState {
        EnvState {
            available_energy: 100,
            agents: vec![
                AgentState::new("a", 10, "always-skip"),
                AgentState::new("b", 10, "always-skip"),
            ],
            n_rounds: 3,
            energy_usage_rate: 5,
            receiver_agent: "a".to_string(),
            current_round: 0,
            current_agent_idx: 0,
        }
    }

    #[test]
    fn test_agent_state_deserializes_with_defaults() {
        let agent: AgentState =
            serde_json::from_str(r#"{"id": "agent_0", "energy": 300, "model": "gpt-4.1"}"#)
                .unwrap();

        assert_eq!(agent.status, AgentStatus::Alive);
        assert!(agent.messages.is_empty());
    }

    #[test]
    fn test_message_serializes_role_lowercase() {
        let json = serde_json::to_value(Message::from_system("hello")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "from system: hello");
    }

    #[test]
    fn test_validate_accepts_well_formed_state() {
        assert!(state().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_receiver() {
        let mut s = state();
        s.receiver_agent = "z".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut s = state();
        s.agents[1].id = "a".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_alive_lookup_skips_deceased() {
        let mut s = state();
        s.agents[1].status = AgentStatus::Deceased;

        assert!(s.alive_agent_mut("b").is_none());
        assert!(!s.is_alive("b"));
        assert_eq!(s.alive_count(), 1);
    }
}
