use crate::domain::action::Decision;
use crate::domain::model::{AgentObservation, Message};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Output of one call to an [`ActionModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    pub decision: Decision,
    /// Transcript additions for the deciding agent, recorded as message
    /// events right after the decision.
    pub messages: Vec<Message>,
}

impl ModelTurn {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            messages: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

/// Chooses an agent's move from what the agent has seen so far.
#[async_trait]
pub trait ActionModel: Send + Sync {
    async fn decide(&self, observation: &AgentObservation) -> Result<ModelTurn>;
}
