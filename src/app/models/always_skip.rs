use crate::domain::action::{Action, Decision};
use crate::domain::model::AgentObservation;
use crate::domain::ports::{ActionModel, ModelTurn};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Baseline that never acts. Useful for checking the energy arithmetic of a
/// scenario without spending API calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSkipModel;

#[async_trait]
impl ActionModel for AlwaysSkipModel {
    async fn decide(&self, _observation: &AgentObservation) -> Result<ModelTurn> {
        Ok(ModelTurn::new(Decision::new(
            "I always skip my turn",
            Action::SkipTurn,
        )))
    }
}
