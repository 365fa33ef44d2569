use anyhow::Context;
use clap::Parser;
use ml2_engine::core::ConfigProvider;
use ml2_engine::domain::model::ConvergenceStatus;
use ml2_engine::domain::ports::ReportSink;
use ml2_engine::utils::monitor::SolveMonitor;
use ml2_engine::utils::{logger, validation::Validate};
use ml2_engine::{FileExporter, LocalStorage, ReportingAdapter, ScenarioBatch, SimulationEngine};

#[derive(Parser)]
#[command(name = "ml2-scenarios")]
#[command(about = "Run a batch of named ML2 policy scenarios")]
struct Args {
    /// Path to scenario batch file
    #[arg(short, long, default_value = "scenarios.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[arg(long)]
    monitor: bool,

    /// Show the scenarios without solving them
    #[arg(long)]
    dry_run: bool,

    /// Run only these scenarios (comma-separated)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting ML2 scenario batch");
    tracing::info!("📁 Loading batch configuration from: {}", args.config);

    let batch = match ScenarioBatch::from_file(&args.config) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("❌ Failed to load batch file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = batch.validate() {
        tracing::error!("❌ Batch validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let scenarios: Vec<_> = batch
        .enabled_scenarios()
        .filter(|s| args.only.is_empty() || args.only.contains(&s.name))
        .collect();

    if args.dry_run {
        println!("📋 Batch '{}' ({} scenario(s)):", batch.batch.name, scenarios.len());
        for (i, scenario) in scenarios.iter().enumerate() {
            println!("  {}. {} {:?}", i + 1, scenario.name, scenario.instruments);
        }
        return Ok(());
    }

    let config = batch
        .engine_config()
        .context("failed to load the engine configuration named by the batch")?;
    config.validate()?;
    let engine = SimulationEngine::from_config(&config, &config.scalars()?)
        .context("failed to build the ML2 engine")?;
    let exporter = FileExporter::new(
        LocalStorage::new(config.output_path()),
        ReportingAdapter::new(engine.registry().clone()),
        config.export_formats().to_vec(),
        batch.batch.name.clone(),
    );
    let monitor = SolveMonitor::new(args.monitor);

    let mut failed = 0;
    for scenario in &scenarios {
        tracing::info!("▶️ Running scenario '{}'", scenario.name);
        let outcome = match engine.simulate(&scenario.name, &scenario.instruments).await {
            Ok(result) => exporter.publish(&result).await.map(|paths| (result, paths)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((result, paths)) => {
                let diverged = result
                    .convergence
                    .scenario
                    .iter()
                    .any(|r| r.status == ConvergenceStatus::Diverged);
                let marker = if diverged { "⚠️" } else { "✅" };
                println!("{} {} -> {}", marker, scenario.name, paths.join(", "));
            }
            Err(e) => {
                failed += 1;
                tracing::error!("❌ Scenario '{}' failed: {}", scenario.name, e);
                eprintln!("❌ {}: {}", scenario.name, e.user_friendly_message());
                if !batch.batch.continue_on_error {
                    std::process::exit(2);
                }
            }
        }
        monitor.log_stats(&scenario.name);
    }

    monitor.log_final_stats();
    tracing::info!(
        "🏁 Batch '{}' finished: {} succeeded, {} failed",
        batch.batch.name,
        scenarios.len() - failed,
        failed
    );
    if failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}
