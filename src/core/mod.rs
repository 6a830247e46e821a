pub mod env;
pub mod experiment;
pub mod prompt;
pub mod registry;

pub use crate::domain::model::{AgentObservation, AgentState, EnvState};
pub use crate::domain::ports::{ActionModel, ModelTurn, Storage};
pub use crate::utils::error::Result;
