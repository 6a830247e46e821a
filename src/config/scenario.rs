use crate::domain::model::{AgentState, EnvState};
use crate::utils::error::{BenchError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative, validate_positive_number, validate_range,
    Validate,
};
use serde::{Deserialize, Serialize};

/// Parameters of a homogeneous game: `n_agents` agents driven by the same
/// model, all starting with the same energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub n_agents: usize,
    pub n_rounds: u32,
    pub energy_usage_rate: i64,
    pub starting_energy: i64,
    pub model: String,
    /// Energy in the whole system. Defaults to exactly what every agent
    /// needs to survive every round.
    #[serde(default)]
    pub total_energy: Option<i64>,
    #[serde(default)]
    pub receiver_index: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            n_agents: 4,
            n_rounds: 10,
            energy_usage_rate: 100,
            starting_energy: 300,
            model: "gpt-4.1".to_string(),
            total_energy: None,
            receiver_index: 0,
        }
    }
}

impl ScenarioConfig {
    pub fn total_energy(&self) -> Result<i64> {
        match self.total_energy {
            Some(total) => Ok(total),
            None => i64::try_from(self.n_agents)
                .ok()
                .and_then(|n| n.checked_mul(i64::from(self.n_rounds)))
                .and_then(|n| n.checked_mul(self.energy_usage_rate))
                .ok_or_else(|| overflow("energy_usage_rate", self.energy_usage_rate)),
        }
    }

    /// Energy handed to the agents before the first round.
    pub fn starting_total(&self) -> Result<i64> {
        i64::try_from(self.n_agents)
            .ok()
            .and_then(|n| n.checked_mul(self.starting_energy))
            .ok_or_else(|| overflow("starting_energy", self.starting_energy))
    }

    /// What is left for the environment to hand out after the agents got
    /// their starting energy.
    pub fn pool_energy(&self) -> Result<i64> {
        let total = self.total_energy()?;
        let starting = self.starting_total()?;
        total
            .checked_sub(starting)
            .ok_or_else(|| overflow("total_energy", total))
    }

    pub fn agent_id(index: usize) -> String {
        format!("agent_{}", index)
    }

    pub fn to_env_state(&self) -> Result<EnvState> {
        self.validate()?;

        let agents: Vec<AgentState> = (0..self.n_agents)
            .map(|i| AgentState::new(Self::agent_id(i), self.starting_energy, self.model.clone()))
            .collect();

        Ok(EnvState {
            available_energy: self.pool_energy()?,
            receiver_agent: agents[self.receiver_index].id.clone(),
            agents,
            n_rounds: self.n_rounds,
            energy_usage_rate: self.energy_usage_rate,
            current_round: 0,
            current_agent_idx: 0,
        })
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("n_agents", self.n_agents, 1)?;
        validate_positive_number("n_rounds", self.n_rounds as usize, 1)?;
        validate_non_negative("energy_usage_rate", self.energy_usage_rate)?;
        validate_non_negative("starting_energy", self.starting_energy)?;
        validate_non_empty_string("model", &self.model)?;
        validate_range("receiver_index", self.receiver_index, 0, self.n_agents - 1)?;

        if self.pool_energy()? < 0 {
            return Err(BenchError::InvalidConfigValueError {
                field: "total_energy".to_string(),
                value: self.total_energy()?.to_string(),
                reason: format!(
                    "Total energy is smaller than the {} units handed out at the start",
                    self.starting_total()?
                ),
            });
        }
        Ok(())
    }
}

fn overflow(field: &str, value: i64) -> BenchError {
    BenchError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: "Energy totals do not fit in a 64-bit integer".to_string(),
    }
}
