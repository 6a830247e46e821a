use agent_social_bench::core::Storage;
use agent_social_bench::utils::error::BenchError;
use agent_social_bench::utils::logger;
use agent_social_bench::{CliConfig, Credentials, Env, LocalStorage, ModelRegistry, ProviderSettings};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting agent-social-bench");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    match play(&config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("❌ Game failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    }
}

async fn play(config: &CliConfig) -> Result<(), BenchError> {
    let credentials = Credentials::from_env();
    let registry = ModelRegistry::with_defaults(&credentials, &ProviderSettings::default())?;

    let state = config.scenario().to_env_state()?;
    let mut env = Env::new(state, &registry)?;
    env.run().await?;

    println!(
        "The game ended with a score of {} / {}",
        env.score(),
        env.max_score()
    );

    let storage = LocalStorage::new(&config.output_path);
    storage
        .write_file("env_state.json", env.serialized_state()?.as_bytes())
        .await?;
    storage
        .write_file("event_log.json", env.serialize_log()?.as_bytes())
        .await?;
    println!("📁 Output saved to: {}", config.output_path);

    Ok(())
}

