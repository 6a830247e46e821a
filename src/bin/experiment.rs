use agent_social_bench::utils::error::BenchError;
use agent_social_bench::utils::{logger, validation::Validate};
use agent_social_bench::{Credentials, Experiment, ExperimentConfig, ModelRegistry};
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "experiment")]
#[command(about = "Run a replicated agent experiment described by a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "experiment.toml")]
    config: String,

    /// Override the log directory from the config
    #[arg(long)]
    log_dir: Option<String>,

    /// Override the number of replications from the config
    #[arg(long)]
    replications: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Show what would be run without calling any model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match ExperimentConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(log_dir) = &args.log_dir {
        config.experiment.log_dir = log_dir.clone();
        tracing::info!("🔧 Log directory overridden to: {}", log_dir);
    }
    if let Some(replications) = args.replications {
        config.experiment.n_replications = replications;
        tracing::info!("🔧 Replications overridden to: {}", replications);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No games will be played");
        return Ok(());
    }

    match run(&config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("❌ Experiment failed: {} (Severity: {:?})", e, e.severity());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    }
}

async fn run(config: &ExperimentConfig) -> Result<(), BenchError> {
    let credentials = Credentials::from_env();
    let registry = Arc::new(ModelRegistry::with_defaults(&credentials, &config.providers)?);

    // Fail before any directory is created if a variant names a model we cannot build.
    for model in config.models() {
        registry.require(model)?;
    }

    let experiment = Experiment::from_config(config, registry);
    let report = experiment.run(config.log_dir()).await?;

    println!("✅ Experiment '{}' completed", report.name);
    for variant in experiment.variant_names() {
        if let Some(mean) = report.mean_score(variant) {
            let max = report
                .variant_trials(variant)
                .map(|t| t.max_score)
                .next()
                .unwrap_or_default();
            println!("  {}: mean score {:.2} / {}", variant, mean, max);
        }
    }
    println!("📁 Output saved to: {}", report.directory.display());
    Ok(())
}

fn display_config_summary(config: &ExperimentConfig) {
    println!("📋 Experiment Summary:");
    println!("  Name: {}", config.name());
    println!("  Replications: {}", config.n_replications());
    println!("  Log directory: {}", config.log_dir());
    println!("  Variants:");
    for variant in &config.variants {
        let scenario = &variant.scenario;
        println!(
            "    {}: {} x {} agents, {} rounds, usage {}, start {}, pool {}",
            variant.name,
            scenario.model,
            scenario.n_agents,
            scenario.n_rounds,
            scenario.energy_usage_rate,
            scenario.starting_energy,
            scenario.pool_energy().unwrap_or_default()
        );
    }
    println!();
}
