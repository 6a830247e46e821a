//! Game events.
//!
//! Every state change in a game goes through an [`Event`]. The environment
//! processes events against its [`EnvState`] and appends them to the event
//! log in processing order, so the log is a full replay of the game.

use crate::domain::action::{Action, Decision};
use crate::domain::model::{AgentStatus, EnvState, Message, Role};
use crate::utils::error::{BenchError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    StartRound { round: u32 },
    GrantEnergy,
    StartTurn { agent_id: String },
    Decision { agent_id: String, decision: Decision },
    Message {
        agent_id: String,
        role: Role,
        content: String,
    },
    Action { agent_id: String, action: Action },
    Metabolism { agent_id: String },
    Death { agent_id: String },
    EndTurn { agent_id: String },
    GameOver,
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::StartRound { .. } => "start_round",
            Event::GrantEnergy => "grant_energy",
            Event::StartTurn { .. } => "start_turn",
            Event::Decision { .. } => "decision",
            Event::Message { .. } => "message",
            Event::Action { .. } => "action",
            Event::Metabolism { .. } => "metabolism",
            Event::Death { .. } => "death",
            Event::EndTurn { .. } => "end_turn",
            Event::GameOver => "game_over",
        }
    }

    pub fn process(&self, state: &mut EnvState) -> Result<()> {
        match self {
            Event::StartRound { round } => {
                state.current_round = *round;
                state.current_agent_idx = 0;
            }
            Event::GrantEnergy => grant_energy(state),
            Event::StartTurn { agent_id } => {
                if let Some(idx) = state.agents.iter().position(|a| &a.id == agent_id) {
                    state.current_agent_idx = idx;
                }
            }
            Event::Decision { .. } | Event::GameOver => {}
            Event::Message {
                agent_id,
                role,
                content,
            } => {
                if let Some(agent) = state.alive_agent_mut(agent_id) {
                    agent.notify(Message::new(*role, content.clone()));
                }
            }
            Event::Action { agent_id, action } => apply_action(state, agent_id, action),
            Event::Metabolism { agent_id } => {
                let usage = state.energy_usage_rate;
                if let Some(agent) = state.alive_agent_mut(agent_id) {
                    agent.energy = agent.energy.saturating_sub(usage);
                }
            }
            Event::Death { agent_id } => {
                let agent = state.alive_agent_mut(agent_id).ok_or_else(|| {
                    BenchError::UnknownAgentError {
                        agent_id: agent_id.clone(),
                    }
                })?;
                agent.status = AgentStatus::Deceased;
                tracing::debug!("Agent {} died", agent_id);

                for other in state.alive_agents_mut() {
                    other.notify(Message::from_system(format!("Agent {} has died.", agent_id)));
                }
            }
            Event::EndTurn { agent_id } => {
                for agent in state.alive_agents_mut() {
                    if &agent.id == agent_id {
                        let status = format!("You have {} remaining.", agent.energy);
                        agent.notify(Message::from_system(status));
                    } else {
                        agent.notify(Message::from_system(format!(
                            "Agent {} completed their turn.",
                            agent_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Share of the remaining pool for this round, rounded up so the pool is
/// empty after the last round.
fn grant_amount(available: i64, rounds_remaining: u32) -> i64 {
    if available <= 0 || rounds_remaining == 0 {
        return 0;
    }
    let rounds = i64::from(rounds_remaining);
    available / rounds + i64::from(available % rounds != 0)
}

fn grant_energy(state: &mut EnvState) {
    let amount = grant_amount(state.available_energy, state.rounds_remaining());
    let receiver = state.receiver_agent.clone();

    let Some(agent) = state.alive_agent_mut(&receiver) else {
        tracing::debug!("Receiver {} is not alive, no energy granted", receiver);
        return;
    };
    agent.energy = agent.energy.saturating_add(amount);
    agent.notify(Message::from_system(format!(
        "You have been given {} units of energy from the environment.",
        amount
    )));
    state.available_energy -= amount;
}

fn alive_index(state: &EnvState, agent_id: &str) -> Option<usize> {
    state
        .agents
        .iter()
        .position(|a| a.id == agent_id && a.is_alive())
}

fn apply_action(state: &mut EnvState, agent_id: &str, action: &Action) {
    let Some(actor) = alive_index(state, agent_id) else {
        return;
    };

    match action {
        Action::Speak { message } => {
            for other in state.alive_agents_mut().filter(|a| a.id != agent_id) {
                other.notify(Message::user(format!("from {}: {}", agent_id, message)));
            }
        }
        Action::Give { target, amount } => {
            let Some(target_idx) = alive_index(state, target) else {
                state.agents[actor].notify(invalid_target(target));
                return;
            };
            let moved = transfer(state, actor, target_idx, *amount);
            state.agents[actor].notify(Message::from_system(format!(
                "you gave {} {} units of energy.",
                target, moved
            )));
            if target_idx != actor {
                state.agents[target_idx].notify(Message::from_system(format!(
                    "agent {} gave you {} units of energy.",
                    agent_id, moved
                )));
            }
        }
        Action::Take { target, amount } => {
            let Some(target_idx) = alive_index(state, target) else {
                state.agents[actor].notify(invalid_target(target));
                return;
            };
            let moved = transfer(state, target_idx, actor, *amount);
            state.agents[actor].notify(Message::from_system(format!(
                "you took {} units of energy from {}.",
                moved, target
            )));
            if target_idx != actor {
                state.agents[target_idx].notify(Message::from_system(format!(
                    "agent {} took {} units of energy from you.",
                    agent_id, moved
                )));
            }
        }
        Action::SkipTurn => {}
    }
}

fn invalid_target(target: &str) -> Message {
    Message::from_system(format!("target {} is invalid.", target))
}

/// Moves up to `amount` from `from` to `to`, never more than `from` holds and
/// never a negative quantity. Returns what was moved.
fn transfer(state: &mut EnvState, from: usize, to: usize, amount: i64) -> i64 {
    let moved = amount.min(state.agents[from].energy).max(0);
    state.agents[from].energy -= moved;
    state.agents[to].energy = state.agents[to].energy.saturating_add(moved);
    moved
}
