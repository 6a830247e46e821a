pub mod credentials;
pub mod providers;
pub mod scenario;
pub mod toml_config;

pub use credentials::Credentials;
pub use providers::{ProviderConfig, ProviderSettings};
pub use scenario::ScenarioConfig;
pub use toml_config::ExperimentConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "agent-social-bench")]
#[command(about = "Run one energy-sharing game between LLM agents")]
pub struct CliConfig {
    #[arg(long = "agents", default_value = "4")]
    pub n_agents: usize,

    #[arg(long = "rounds", default_value = "10")]
    pub n_rounds: u32,

    #[arg(long = "usage-rate", default_value = "100")]
    pub energy_usage_rate: i64,

    #[arg(long, default_value = "300")]
    pub starting_energy: i64,

    /// Total energy in the game; defaults to agents * rounds * usage rate
    #[arg(long)]
    pub total_energy: Option<i64>,

    #[arg(long, default_value = "gpt-4.1")]
    pub model: String,

    #[arg(long, default_value = "./data")]
    pub output_path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn scenario(&self) -> ScenarioConfig {
        ScenarioConfig {
            n_agents: self.n_agents,
            n_rounds: self.n_rounds,
            energy_usage_rate: self.energy_usage_rate,
            starting_energy: self.starting_energy,
            model: self.model.clone(),
            total_energy: self.total_energy,
            receiver_index: 0,
        }
    }
}
