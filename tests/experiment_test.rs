use agent_social_bench::app::models::AlwaysSkipModel;
use agent_social_bench::core::registry::ALWAYS_SKIP;
use agent_social_bench::domain::model::EnvState;
use agent_social_bench::{
    BenchError, Env, Event, Experiment, ExperimentConfig, ExperimentReport, ModelRegistry,
    ScenarioConfig,
};
use std::sync::Arc;
use tempfile::TempDir;

fn registry() -> Arc<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    registry.register(ALWAYS_SKIP, AlwaysSkipModel);
    Arc::new(registry)
}

const CONFIG: &str = r#"
[experiment]
name = "baseline"
n_replications = 10

[[variants]]
name = "four_agents"
n_agents = 4
n_rounds = 10
energy_usage_rate = 100
starting_energy = 300
model = "always-skip"

[[variants]]
name = "rich_pair"
n_agents = 2
n_rounds = 3
energy_usage_rate = 10
starting_energy = 1000
total_energy = 2060
model = "always-skip"
"#;

#[tokio::test]
async fn test_experiment_writes_trial_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = ExperimentConfig::from_toml_str(CONFIG).unwrap();

    let experiment = Experiment::from_config(&config, registry());
    let report = experiment.run(temp_dir.path()).await.unwrap();

    assert!(report.directory.starts_with(temp_dir.path()));
    let dir_name = report.directory.file_name().unwrap().to_str().unwrap();
    assert!(dir_name.starts_with("baseline_"));
    assert_eq!(dir_name.len(), "baseline_".len() + 14);

    for variant in ["four_agents", "rich_pair"] {
        for trial in ["00", "05", "09"] {
            let state_path = report
                .directory
                .join(variant)
                .join(format!("env_state_{}.json", trial));
            let log_path = report
                .directory
                .join(variant)
                .join(format!("event_log_{}.json", trial));
            assert!(state_path.exists(), "missing {}", state_path.display());
            assert!(log_path.exists(), "missing {}", log_path.display());
        }
    }

    let state: EnvState = serde_json::from_slice(
        &std::fs::read(report.directory.join("four_agents/env_state_03.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(state.available_energy, 1960);

    let log: Vec<Event> = serde_json::from_slice(
        &std::fs::read(report.directory.join("four_agents/event_log_03.json")).unwrap(),
    )
    .unwrap();
    assert!(matches!(log.last(), Some(Event::GameOver)));
}

#[tokio::test]
async fn test_experiment_report_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    let config = ExperimentConfig::from_toml_str(CONFIG).unwrap();

    let report = Experiment::from_config(&config, registry())
        .run(temp_dir.path().join("nested/logs"))
        .await
        .unwrap();

    assert_eq!(report.trials.len(), 20);
    assert_eq!(report.mean_score("four_agents"), Some(12.0));
    assert_eq!(report.mean_score("rich_pair"), Some(6.0));

    // trials run replication-major: every variant once, then the next replication
    assert_eq!(report.trials[0].variant, "four_agents");
    assert_eq!(report.trials[1].variant, "rich_pair");
    assert_eq!(report.trials[2].trial, 1);

    let summary: ExperimentReport = serde_json::from_slice(
        &std::fs::read(report.directory.join("summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary, report);
}

#[tokio::test]
async fn test_log_dir_must_be_a_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("not_a_dir");
    std::fs::write(&file_path, b"occupied").unwrap();

    let experiment = Experiment::new("e", 1).with_variant("v", || {
        let registry = registry();
        let scenario = ScenarioConfig {
            model: ALWAYS_SKIP.to_string(),
            ..ScenarioConfig::default()
        };
        Env::new(scenario.to_env_state()?, &registry)
    });

    let err = experiment.run(&file_path).await.unwrap_err();
    assert!(matches!(err, BenchError::InvalidConfigValueError { .. }));
}

#[tokio::test]
async fn test_factory_error_stops_experiment() {
    let temp_dir = TempDir::new().unwrap();
    let experiment = Experiment::new("broken", 2).with_variant("unknown_model", || {
        let scenario = ScenarioConfig {
            model: "nobody".to_string(),
            ..ScenarioConfig::default()
        };
        Env::new(scenario.to_env_state()?, &registry())
    });

    let err = experiment.run(temp_dir.path()).await.unwrap_err();
    assert!(matches!(err, BenchError::UnsupportedModelError { .. }));
}
