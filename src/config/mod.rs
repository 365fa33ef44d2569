pub mod cli;
pub mod scenario_config;
pub mod toml_config;

pub use cli::LocalStorage;
pub use scenario_config::{ScenarioBatch, ScenarioDefinition};
pub use toml_config::EngineConfig;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{ExportFormat, InstrumentVector, SolverSettings};
#[cfg(feature = "cli")]
use crate::utils::error::{Ml2Error, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ml2-engine")]
#[command(about = "Multi-year macroeconomic policy simulation on the ML2 model")]
pub struct CliConfig {
    #[arg(long, help = "Engine configuration file (TOML)")]
    pub config: Option<String>,

    #[arg(long, help = "Calibration file replacing the embedded ML2 data")]
    pub calibration: Option<String>,

    #[arg(long, default_value = "", help = "Scenario name, also used for output file names")]
    pub name: String,

    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    #[arg(long, help = "Solve and report the baseline only")]
    pub baseline_only: bool,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub format: Vec<ExportFormat>,

    #[arg(long)]
    pub max_iterations: Option<usize>,

    #[arg(long)]
    pub tolerance: Option<f64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
fn parse_assignment(raw: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing instrument key in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {}: {}", key, e))?;
    Ok((key.to_string(), value))
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Requested instrument overrides; a repeated key keeps the last value.
    pub fn instruments(&self) -> InstrumentVector {
        self.set.iter().cloned().collect()
    }

    /// File configuration (or defaults) with command-line flags on top.
    pub fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📄 Loading configuration from {}", path);
                EngineConfig::from_file(path)?
            }
            None => EngineConfig::default(),
        };

        if let Some(calibration) = &self.calibration {
            config.model.calibration = Some(calibration.clone());
        }
        if let Some(output_path) = &self.output_path {
            config.export.output_path = output_path.clone();
        }
        if !self.format.is_empty() {
            config.export.formats = self.format.clone();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.solver.max_iterations = max_iterations;
        }
        if let Some(tolerance) = self.tolerance {
            config.solver.tolerance = tolerance;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            crate::utils::validation::validate_path("config", path)?;
        }
        if let Some(path) = &self.calibration {
            crate::utils::validation::validate_path("calibration", path)?;
        }
        if self.baseline_only && !self.set.is_empty() {
            return Err(Ml2Error::InvalidConfigValue {
                field: "set".to_string(),
                value: format!("{} override(s)", self.set.len()),
                reason: "Instrument overrides cannot be combined with --baseline-only"
                    .to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn solver_settings(&self) -> SolverSettings {
        let mut settings = SolverSettings::default();
        if let Some(max_iterations) = self.max_iterations {
            settings.max_iterations = max_iterations;
        }
        if let Some(tolerance) = self.tolerance {
            settings.tolerance = tolerance;
        }
        settings
    }

    fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or("./output")
    }

    fn export_formats(&self) -> &[ExportFormat] {
        if self.format.is_empty() {
            &[ExportFormat::Json]
        } else {
            &self.format
        }
    }

    fn calibration_path(&self) -> Option<&str> {
        self.calibration.as_deref()
    }
}
