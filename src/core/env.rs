//! The game engine.
//!
//! An [`Env`] owns the [`EnvState`] of one game and drives it round by round:
//! each round the receiver is granted energy from the pool, then every living
//! agent takes a turn (decide, act, pay the metabolism cost, possibly die).
//! The game stops early once fewer than two agents are alive.
//!
//! All mutations go through [`Event`]s, which are logged in processing order.

use crate::core::prompt::system_prompt;
use crate::core::registry::ModelRegistry;
use crate::domain::event::Event;
use crate::domain::model::{AgentObservation, EnvState, Message};
use crate::domain::ports::{ActionModel, ModelTurn};
use crate::utils::error::{BenchError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub type EventLog = Vec<Event>;

/// Headline numbers of a finished (or interrupted) game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub score: usize,
    pub max_score: usize,
    pub last_round: u32,
    pub survivors: Vec<String>,
}

pub struct Env {
    state: EnvState,
    models: HashMap<String, Arc<dyn ActionModel>>,
    event_log: EventLog,
}

impl Env {
    /// Validates the state, resolves every agent's model in `registry` and
    /// seeds each living agent's transcript with the system prompt.
    pub fn new(state: EnvState, registry: &ModelRegistry) -> Result<Self> {
        state.validate()?;

        let mut models = HashMap::new();
        for agent in &state.agents {
            if !models.contains_key(&agent.model) {
                models.insert(agent.model.clone(), registry.require(&agent.model)?);
            }
        }

        let mut env = Self {
            state,
            models,
            event_log: Vec::new(),
        };
        env.init_agent_prompts();
        Ok(env)
    }

    fn init_agent_prompts(&mut self) {
        let prompts: Vec<(usize, String)> = self
            .state
            .agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.is_alive())
            .map(|(idx, agent)| (idx, system_prompt(agent, &self.state)))
            .collect();

        for (idx, prompt) in prompts {
            self.state.agents[idx].notify(Message::system(prompt));
        }
    }

    pub fn state(&self) -> &EnvState {
        &self.state
    }

    pub fn event_log(&self) -> &[Event] {
        &self.event_log
    }

    pub fn alive_agent_ids(&self) -> Vec<&str> {
        self.state.alive_agents().map(|a| a.id.as_str()).collect()
    }

    /// Processes `events` in order and appends each one to the log. Stops at
    /// the first event that fails; earlier events stay applied.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = Event>) -> Result<()> {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    fn apply(&mut self, event: Event) -> Result<()> {
        event.process(&mut self.state)?;
        self.event_log.push(event);
        Ok(())
    }

    async fn decide(&self, agent_idx: usize) -> Result<ModelTurn> {
        let agent = &self.state.agents[agent_idx];
        let model = self
            .models
            .get(&agent.model)
            .ok_or_else(|| BenchError::UnsupportedModelError {
                model: agent.model.clone(),
                available: self.models.keys().cloned().collect(),
            })?;

        model.decide(&AgentObservation::from_state(agent)).await
    }

    /// Plays the game to the end. An action model error aborts the game and
    /// is returned; the state and log keep everything up to that point.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            "Starting game: {} agents, {} rounds, {} energy in the pool",
            self.state.agents.len(),
            self.state.n_rounds,
            self.state.available_energy
        );

        for round in 0..self.state.n_rounds {
            self.apply(Event::StartRound { round })?;
            self.apply(Event::GrantEnergy)?;

            for idx in 0..self.state.agents.len() {
                if !self.state.agents[idx].is_alive() {
                    continue;
                }
                self.play_turn(idx).await?;
            }

            if self.state.alive_count() < 2 {
                tracing::info!("Game over. Too many agents died.");
                self.apply(Event::GameOver)?;
                break;
            }
        }

        tracing::info!(
            "Game finished with a score of {} / {}",
            self.score(),
            self.max_score()
        );
        Ok(())
    }

    async fn play_turn(&mut self, idx: usize) -> Result<()> {
        let agent_id = self.state.agents[idx].id.clone();
        self.apply(Event::StartTurn {
            agent_id: agent_id.clone(),
        })?;

        let turn = self.decide(idx).await?;
        tracing::debug!(
            "Round {}: {} chose {} ({})",
            self.state.current_round,
            agent_id,
            turn.decision.action.name(),
            turn.decision.reasoning
        );

        let action = turn.decision.action.clone();
        self.apply(Event::Decision {
            agent_id: agent_id.clone(),
            decision: turn.decision,
        })?;
        for message in turn.messages {
            self.apply(Event::Message {
                agent_id: agent_id.clone(),
                role: message.role,
                content: message.content,
            })?;
        }
        self.apply(Event::Action {
            agent_id: agent_id.clone(),
            action,
        })?;
        self.apply(Event::Metabolism {
            agent_id: agent_id.clone(),
        })?;

        if self.state.agents[idx].energy <= 0 {
            self.apply(Event::Death { agent_id })
        } else {
            self.apply(Event::EndTurn { agent_id })
        }
    }

    /// Cumulative number of turns started, i.e. agent-rounds survived.
    pub fn score(&self) -> usize {
        self.event_log
            .iter()
            .filter(|e| matches!(e, Event::StartTurn { .. }))
            .count()
    }

    pub fn max_score(&self) -> usize {
        self.state.n_rounds as usize * self.state.agents.len()
    }

    pub fn outcome(&self) -> GameOutcome {
        GameOutcome {
            score: self.score(),
            max_score: self.max_score(),
            last_round: self.state.current_round,
            survivors: self.alive_agent_ids().into_iter().map(String::from).collect(),
        }
    }

    pub fn serialized_state(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    pub fn serialize_log(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.event_log)?)
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("state", &self.state)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("events", &self.event_log.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::AlwaysSkipModel;
    use crate::config::ScenarioConfig;
    use crate::core::registry::ALWAYS_SKIP;
    use crate::domain::action::{Action, Decision};
    use crate::domain::model::{AgentStatus, Role};
    use async_trait::async_trait;

    /// Gives everything to the next agent in line, every turn.
    struct GenerousModel;

    #[async_trait]
    impl ActionModel for GenerousModel {
        async fn decide(&self, observation: &AgentObservation) -> Result<ModelTurn> {
            Ok(ModelTurn::new(Decision::new(
                "sharing",
                Action::Give {
                    target: "agent_1".to_string(),
                    amount: observation.energy,
                },
            ))
            .with_message(Message::assistant("giving it all away")))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ActionModel for FailingModel {
        async fn decide(&self, _observation: &AgentObservation) -> Result<ModelTurn> {
            Err(BenchError::ModelOutputError {
                provider: "Test".to_string(),
                message: "no decision".to_string(),
            })
        }
    }

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(ALWAYS_SKIP, AlwaysSkipModel);
        registry.register("generous", GenerousModel);
        registry.register("failing", FailingModel);
        registry
    }

    fn scenario(model: &str) -> ScenarioConfig {
        ScenarioConfig {
            model: model.to_string(),
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn test_new_seeds_system_prompts() {
        let env = Env::new(scenario(ALWAYS_SKIP).to_env_state().unwrap(), &registry()).unwrap();

        for agent in &env.state().agents {
            assert_eq!(agent.messages.len(), 1);
            assert_eq!(agent.messages[0].role, Role::System);
            assert!(agent.messages[0].content.contains(&agent.id));
        }
    }

    #[test]
    fn test_new_rejects_unknown_model() {
        let err = Env::new(scenario("mystery").to_env_state().unwrap(), &registry()).unwrap_err();

        match err {
            BenchError::UnsupportedModelError { model, available } => {
                assert_eq!(model, "mystery");
                assert!(available.contains(&ALWAYS_SKIP.to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_always_skip_reference_game() {
        let mut env =
            Env::new(scenario(ALWAYS_SKIP).to_env_state().unwrap(), &registry()).unwrap();
        env.run().await.unwrap();

        assert_eq!(env.score(), 12);
        assert_eq!(env.max_score(), 40);
        assert_eq!(env.state().current_round, 2);
        assert_eq!(env.state().available_energy, 1960);
        assert_eq!(env.state().agents[0].energy, 840);
        assert_eq!(env.alive_agent_ids(), vec!["agent_0"]);
        assert!(matches!(env.event_log().last(), Some(Event::GameOver)));
    }

    #[tokio::test]
    async fn test_huge_pool_drains_without_overflow() {
        let mut state = scenario(ALWAYS_SKIP).to_env_state().unwrap();
        state.available_energy = i64::MAX;
        state.n_rounds = 3;

        let mut env = Env::new(state, &registry()).unwrap();
        env.run().await.unwrap();

        assert_eq!(env.score(), 12);
        assert_eq!(env.state().available_energy, 0);
        assert!(env.state().agents[0].energy > i64::MAX / 2);
        assert_eq!(env.alive_agent_ids(), vec!["agent_0"]);
    }

    #[tokio::test]
    async fn test_turn_event_order() {
        let mut env = Env::new(scenario("generous").to_env_state().unwrap(), &registry()).unwrap();
        env.run().await.unwrap();

        let kinds: Vec<&str> = env.event_log().iter().take(8).map(Event::event_type).collect();
        assert_eq!(
            kinds,
            vec![
                "start_round",
                "grant_energy",
                "start_turn",
                "decision",
                "message",
                "action",
                "metabolism",
                "death",
            ]
        );
    }

    #[tokio::test]
    async fn test_model_messages_land_in_transcript() {
        let mut env = Env::new(scenario("generous").to_env_state().unwrap(), &registry()).unwrap();
        env.run().await.unwrap();

        let giver = &env.state().agents[0];
        assert_eq!(giver.status, AgentStatus::Deceased);
        assert!(giver
            .messages
            .iter()
            .any(|m| m.role == Role::Assistant && m.content == "giving it all away"));
    }

    #[tokio::test]
    async fn test_model_error_aborts_run() {
        let mut env = Env::new(scenario("failing").to_env_state().unwrap(), &registry()).unwrap();

        let err = env.run().await.unwrap_err();
        assert!(matches!(err, BenchError::ModelOutputError { .. }));
        assert_eq!(env.score(), 1);
    }

    #[test]
    fn test_apply_events_logs_each_event() {
        let mut env =
            Env::new(scenario(ALWAYS_SKIP).to_env_state().unwrap(), &registry()).unwrap();

        env.apply_events(vec![
            Event::StartTurn {
                agent_id: "agent_2".to_string(),
            },
            Event::Death {
                agent_id: "agent_2".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(env.event_log().len(), 2);
        assert_eq!(env.score(), 1);
        assert_eq!(env.alive_agent_ids(), vec!["agent_0", "agent_1", "agent_3"]);
    }

    #[tokio::test]
    async fn test_serialized_state_round_trips() {
        let mut env =
            Env::new(scenario(ALWAYS_SKIP).to_env_state().unwrap(), &registry()).unwrap();
        env.run().await.unwrap();

        let state: EnvState = serde_json::from_str(&env.serialized_state().unwrap()).unwrap();
        assert_eq!(&state, env.state());

        let log: Vec<Event> = serde_json::from_str(&env.serialize_log().unwrap()).unwrap();
        assert_eq!(log.len(), env.event_log().len());
    }
}
