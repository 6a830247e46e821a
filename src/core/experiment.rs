use crate::adapters::LocalStorage;
use crate::config::ExperimentConfig;
use crate::core::env::Env;
use crate::core::registry::ModelRegistry;
use crate::domain::ports::Storage;
use crate::utils::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

pub const SUMMARY_FILE: &str = "summary.json";

pub type EnvFactory = Box<dyn Fn() -> Result<Env> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub variant: String,
    pub trial: usize,
    pub score: usize,
    pub max_score: usize,
    pub last_round: u32,
    pub survivors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub name: String,
    pub directory: PathBuf,
    pub trials: Vec<TrialResult>,
}

impl ExperimentReport {
    pub fn variant_trials<'a>(&'a self, variant: &'a str) -> impl Iterator<Item = &'a TrialResult> {
        self.trials.iter().filter(move |t| t.variant == variant)
    }

    pub fn mean_score(&self, variant: &str) -> Option<f64> {
        let scores: Vec<usize> = self.variant_trials(variant).map(|t| t.score).collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<usize>() as f64 / scores.len() as f64)
    }
}

/// Replicates games for a set of named variants and stores each game's final
/// state and event log under a timestamped directory.
pub struct Experiment {
    name: String,
    n_replications: usize,
    variants: Vec<(String, EnvFactory)>,
}

impl Experiment {
    pub fn new(name: impl Into<String>, n_replications: usize) -> Self {
        Self {
            name: name.into(),
            n_replications,
            variants: Vec::new(),
        }
    }

    pub fn with_variant<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Env> + Send + Sync + 'static,
    {
        self.variants.push((name.into(), Box::new(factory)));
        self
    }

    /// One variant per `[[variants]]` entry, each building a fresh game from
    /// its scenario.
    pub fn from_config(config: &ExperimentConfig, registry: Arc<ModelRegistry>) -> Self {
        config.variants.iter().fold(
            Self::new(config.name(), config.n_replications()),
            |experiment, variant| {
                let scenario = variant.scenario.clone();
                let registry = Arc::clone(&registry);
                experiment.with_variant(variant.name.clone(), move || {
                    Env::new(scenario.to_env_state()?, &registry)
                })
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// `env_state_7.json` for trial 7 of 10, `env_state_07.json` of 100.
    fn trial_file(&self, prefix: &str, trial: usize) -> String {
        let width = self.n_replications.to_string().len();
        format!("{}_{:0width$}.json", prefix, trial, width = width)
    }

    async fn prepare_directories(&self, log_dir: &Path) -> Result<PathBuf> {
        if log_dir.exists() && !log_dir.is_dir() {
            return Err(BenchError::InvalidConfigValueError {
                field: "log_dir".to_string(),
                value: log_dir.display().to_string(),
                reason: "Expected log_dir to be a directory".to_string(),
            });
        }
        fs::create_dir_all(log_dir).await?;

        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let experiment_dir = log_dir.join(format!("{}_{}", self.name, timestamp));
        fs::create_dir(&experiment_dir).await?;

        for (variant, _) in &self.variants {
            fs::create_dir(experiment_dir.join(variant)).await?;
        }
        Ok(experiment_dir)
    }

    pub async fn run(&self, log_dir: impl AsRef<Path>) -> Result<ExperimentReport> {
        let experiment_dir = self.prepare_directories(log_dir.as_ref()).await?;
        let storage = LocalStorage::new(&experiment_dir);
        tracing::info!(
            "Running experiment '{}' ({} variants x {} replications) into {}",
            self.name,
            self.variants.len(),
            self.n_replications,
            experiment_dir.display()
        );

        let mut trials = Vec::new();
        for trial in 0..self.n_replications {
            for (variant, factory) in &self.variants {
                tracing::info!("Running trial {} for variant {}", trial, variant);
                let mut env = factory()?;
                env.run().await?;

                storage
                    .write_file(
                        &format!("{}/{}", variant, self.trial_file("env_state", trial)),
                        env.serialized_state()?.as_bytes(),
                    )
                    .await?;
                storage
                    .write_file(
                        &format!("{}/{}", variant, self.trial_file("event_log", trial)),
                        env.serialize_log()?.as_bytes(),
                    )
                    .await?;

                let outcome = env.outcome();
                trials.push(TrialResult {
                    variant: variant.clone(),
                    trial,
                    score: outcome.score,
                    max_score: outcome.max_score,
                    last_round: outcome.last_round,
                    survivors: outcome.survivors,
                });
            }
        }

        let report = ExperimentReport {
            name: self.name.clone(),
            directory: experiment_dir,
            trials,
        };
        storage
            .write_file(SUMMARY_FILE, serde_json::to_string_pretty(&report)?.as_bytes())
            .await?;

        Ok(report)
    }
}
