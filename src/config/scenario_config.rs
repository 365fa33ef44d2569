use super::toml_config::{substitute_env_vars, EngineConfig};
use crate::domain::model::InstrumentVector;
use crate::utils::error::{Ml2Error, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A batch of named scenarios run against one engine configuration.
///
/// ```toml
/// [batch]
/// name = "budget-2013"
/// config = "ml2.toml"
///
/// [[scenarios]]
/// name = "vat-up"
/// instruments = { ITPC0R_X = 23.0 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioBatch {
    pub batch: BatchInfo,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchInfo {
    pub name: String,
    pub description: Option<String>,
    /// Engine configuration file; defaults apply when absent.
    pub config: Option<String>,
    /// Keep going after a rejected scenario.
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub instruments: InstrumentVector,
}

fn default_enabled() -> bool {
    true
}

impl ScenarioBatch {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(Ml2Error::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| Ml2Error::config(format!("TOML parsing error: {}", e)))
    }

    /// 取得啟用的情境
    pub fn enabled_scenarios(&self) -> impl Iterator<Item = &ScenarioDefinition> {
        self.scenarios.iter().filter(|s| s.enabled)
    }

    /// Engine configuration named by the batch, or the defaults.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.batch.config {
            Some(path) => EngineConfig::from_file(path),
            None => Ok(EngineConfig::default()),
        }
    }
}

impl Validate for ScenarioBatch {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("batch.name", &self.batch.name)?;

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            validation::validate_non_empty_string("scenarios.name", &scenario.name)?;
            if !seen.insert(scenario.name.as_str()) {
                return Err(Ml2Error::InvalidConfigValue {
                    field: "scenarios.name".to_string(),
                    value: scenario.name.clone(),
                    reason: "Scenario names must be unique".to_string(),
                });
            }
        }

        if self.enabled_scenarios().next().is_none() {
            return Err(Ml2Error::MissingConfig {
                field: "scenarios".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"
[batch]
name = "budget"

[[scenarios]]
name = "invest"
instruments = { VIG_X = 1000.0 }

[[scenarios]]
name = "vat"
enabled = false
instruments = { ITPC0R_X = 23.0, DTH_X = -500.0 }

[[scenarios]]
name = "baseline-check"
"#;

    #[test]
    fn test_parse_batch() {
        let batch = ScenarioBatch::from_toml_str(BATCH).unwrap();

        assert_eq!(batch.batch.name, "budget");
        assert!(!batch.batch.continue_on_error);
        assert_eq!(batch.scenarios.len(), 3);
        assert_eq!(batch.scenarios[1].instruments["DTH_X"], -500.0);
        assert!(batch.scenarios[2].instruments.is_empty());

        let enabled: Vec<&str> = batch.enabled_scenarios().map(|s| s.name.as_str()).collect();
        assert_eq!(enabled, vec!["invest", "baseline-check"]);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let content = r#"
[batch]
name = "dup"

[[scenarios]]
name = "a"

[[scenarios]]
name = "a"
"#;
        let batch = ScenarioBatch::from_toml_str(content).unwrap();
        assert!(matches!(
            batch.validate(),
            Err(Ml2Error::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_batch_without_enabled_scenarios() {
        let content = r#"
[batch]
name = "empty"

[[scenarios]]
name = "off"
enabled = false
"#;
        let batch = ScenarioBatch::from_toml_str(content).unwrap();
        assert!(matches!(batch.validate(), Err(Ml2Error::MissingConfig { .. })));
    }

    #[test]
    fn test_bundled_batch_is_valid() {
        let batch = ScenarioBatch::from_toml_str(include_str!("../../data/scenarios.toml")).unwrap();
        assert!(batch.validate().is_ok());
        assert!(batch.batch.continue_on_error);
        assert_eq!(batch.enabled_scenarios().count(), 4);
    }

    #[test]
    fn test_default_engine_config() {
        let batch = ScenarioBatch::from_toml_str(BATCH).unwrap();
        let config = batch.engine_config().unwrap();
        assert_eq!(config.export.formats.len(), 1);
    }
}
