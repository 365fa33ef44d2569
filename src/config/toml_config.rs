use crate::core::ConfigProvider;
use crate::domain::model::{ExportFormat, SolverSettings};
use crate::model::scalars::Ml2Scalars;
use crate::utils::error::{Ml2Error, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration file.
///
/// ```toml
/// [solver]
/// tolerance = 1e-6
/// max_iterations = 200
///
/// [model]
/// calibration = "${ML2_DATA}/calibration.toml"
///
/// [scalars]
/// c1 = 0.7
///
/// [export]
/// output_path = "./output"
/// formats = ["json", "xlsx"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub model: ModelConfig,
    /// Overrides for estimated coefficients, by name.
    #[serde(default)]
    pub scalars: toml::Table,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub calibration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<ExportFormat>,
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Json]
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            formats: default_formats(),
        }
    }
}

impl EngineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(Ml2Error::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| Ml2Error::config(format!("TOML parsing error: {}", e)))
    }

    /// Estimated coefficients with the `[scalars]` overrides applied.
    pub fn scalars(&self) -> Result<Ml2Scalars> {
        let scalars = Ml2Scalars::from_overrides(&self.scalars)?;
        scalars.validate()?;
        Ok(scalars)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_solver(&self.solver)?;

        if let Some(calibration) = &self.model.calibration {
            validation::validate_path("model.calibration", calibration)?;
        }
        validation::validate_path("export.output_path", &self.export.output_path)?;

        if self.export.formats.is_empty() {
            return Err(Ml2Error::InvalidConfigValue {
                field: "export.formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one export format is required".to_string(),
            });
        }

        self.scalars().map(|_| ())
    }
}

pub fn validate_solver(solver: &SolverSettings) -> Result<()> {
    validation::validate_above("solver.tolerance", solver.tolerance, 0.0)?;
    validation::validate_positive_number("solver.max_iterations", solver.max_iterations, 1)?;
    validation::validate_above("solver.relaxation", solver.relaxation, 0.0)?;
    validation::validate_range("solver.relaxation", solver.relaxation, 0.0, 1.0)?;
    validation::validate_above(
        "solver.explosion_threshold",
        solver.explosion_threshold,
        solver.tolerance,
    )?;
    Ok(())
}

/// 替換環境變數 (例如 ${ML2_DATA})
pub fn substitute_env_vars(content: &str) -> Result<String> {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| Ml2Error::config(format!("Invalid substitution pattern: {}", e)))?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

impl ConfigProvider for EngineConfig {
    fn solver_settings(&self) -> SolverSettings {
        self.solver
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn export_formats(&self) -> &[ExportFormat] {
        &self.export.formats
    }

    fn calibration_path(&self) -> Option<&str> {
        self.model.calibration.as_deref()
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[solver]
tolerance = 1e-8
max_iterations = 50

[model]
calibration = "data/ml2_calibration.toml"

[scalars]
c1 = 0.7

[export]
output_path = "./runs"
formats = ["json", "csv", "xlsx"]
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.solver.tolerance, 1e-8);
        assert_eq!(config.solver.max_iterations, 50);
        assert_eq!(config.solver.relaxation, 0.5);
        assert_eq!(config.calibration_path(), Some("data/ml2_calibration.toml"));
        assert_eq!(config.export_formats().len(), 3);
        assert_eq!(config.scalars().unwrap().c1, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.solver_settings(), SolverSettings::default());
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.export_formats(), &[ExportFormat::Json]);
        assert!(config.calibration_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ML2_TEST_OUTPUT_DIR", "/tmp/ml2-runs");

        let toml_content = r#"
[export]
output_path = "${ML2_TEST_OUTPUT_DIR}"
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.export.output_path, "/tmp/ml2-runs");

        std::env::remove_var("ML2_TEST_OUTPUT_DIR");
    }

    #[test]
    fn test_solver_validation() {
        let mut config = EngineConfig::default();
        config.solver.relaxation = 0.0;
        assert!(matches!(
            config.validate(),
            Err(Ml2Error::InvalidConfigValue { ref field, .. }) if field == "solver.relaxation"
        ));

        config.solver.relaxation = 1.0;
        config.solver.max_iterations = 0;
        assert!(config.validate().is_err());

        config.solver.max_iterations = 10;
        config.solver.explosion_threshold = 1e-9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_scalar_is_rejected() {
        let config = EngineConfig::from_toml_str("[scalars]\nnot_a_coefficient = 1.0\n").unwrap();
        assert!(matches!(config.validate(), Err(Ml2Error::ConfigError { .. })));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        assert!(EngineConfig::from_toml_str("[pipeline]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nformats = [\"csv\"]").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.export_formats(), &[ExportFormat::Csv]);
        assert_eq!(config.output_path(), "./output");
    }
}
