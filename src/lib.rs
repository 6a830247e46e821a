pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::LocalStorage;
pub use config::{Credentials, ExperimentConfig, ProviderSettings, ScenarioConfig};
pub use self::core::{
    env::{Env, GameOutcome},
    experiment::{Experiment, ExperimentReport},
    registry::ModelRegistry,
};
pub use domain::{
    action::{Action, Decision},
    event::Event,
};
pub use utils::error::{BenchError, Result};
