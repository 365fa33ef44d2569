use clap::Parser;
use ml2_engine::core::ConfigProvider;
use ml2_engine::domain::model::{ConvergenceStatus, KeyIndicators};
use ml2_engine::domain::ports::{ReportSink, Storage};
use ml2_engine::utils::error::ErrorSeverity;
use ml2_engine::utils::monitor::SolveMonitor;
use ml2_engine::utils::{logger, validation::Validate};
use ml2_engine::{CliConfig, FileExporter, LocalStorage, Ml2Error, ReportingAdapter, SimulationEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting ml2-engine CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config).await {
        tracing::error!(
            "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,  // 請求被拒絕
            ErrorSeverity::High => 1,    // 輸出失敗
            ErrorSeverity::Critical => 3, // 模型或設定錯誤
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<(), Ml2Error> {
    let resolved = config.resolve()?;
    let scalars = resolved.scalars()?;

    let monitor = SolveMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let engine = SimulationEngine::from_config(&resolved, &scalars)?;
    tracing::info!(
        "🧮 Model ready: {} variables, {} instruments",
        engine.registry().len(),
        engine.instrument_specs().len()
    );

    let storage = LocalStorage::new(resolved.output_path());
    let adapter = ReportingAdapter::new(engine.registry().clone());

    if config.baseline_only {
        let baseline = engine.baseline().await?;
        monitor.log_stats("Baseline");

        let response = adapter.baseline_response(&baseline);
        let file_name = format!("{}_baseline.json", FileExporter::<LocalStorage>::file_stem(&config.name));
        storage
            .write_file(&file_name, &serde_json::to_vec_pretty(&response)?)
            .await?;

        print_indicators("Baseline", &baseline.indicators);
        report_convergence(baseline.convergence.iter().map(|r| r.status));
        println!("📁 Output saved to: {}/{}", resolved.output_path(), file_name);
        monitor.log_final_stats();
        return Ok(());
    }

    let instruments = config.instruments();
    let result = engine.simulate(&config.name, &instruments).await?;
    monitor.log_stats("Baseline + scenario");

    let exporter = FileExporter::new(
        storage,
        adapter,
        resolved.export_formats().to_vec(),
        String::new(),
    );
    let written = exporter.publish(&result).await?;
    monitor.log_stats("Export");

    print_indicators("Baseline", &result.baseline);
    print_indicators("Scenario", &result.scenario);
    report_convergence(result.convergence.scenario.iter().map(|r| r.status));

    tracing::info!("✅ Simulation completed successfully!");
    println!("✅ Simulation completed successfully!");
    for path in written {
        println!("📁 Output saved to: {}/{}", resolved.output_path(), path);
    }
    monitor.log_final_stats();
    Ok(())
}

fn print_indicators(label: &str, indicators: &KeyIndicators) {
    println!("{}:", label);
    println!(
        "  {:>6} {:>12} {:>12} {:>12} {:>12}",
        "year", "gdp growth", "inflation", "deficit/GDP", "unemployment"
    );
    for (i, year) in indicators.years.iter().enumerate() {
        println!(
            "  {:>6} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
            year,
            indicators.gdp_growth[i],
            indicators.inflation[i],
            indicators.deficit_ratio[i],
            indicators.unemployment[i]
        );
    }
}

fn report_convergence(statuses: impl Iterator<Item = ConvergenceStatus>) {
    let unsolved = statuses
        .filter(|status| *status != ConvergenceStatus::Converged)
        .count();
    if unsolved > 0 {
        tracing::warn!("⚠️ {} year(s) did not converge; see the convergence report", unsolved);
        println!("⚠️ {} year(s) did not converge", unsolved);
    }
}
