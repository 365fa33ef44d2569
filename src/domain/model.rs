use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type Year = i32;

/// Instrument key -> value, as supplied by the caller or fully resolved.
pub type InstrumentVector = BTreeMap<String, f64>;

/// Variable key -> one value per simulated year (aligned with `RunResult::years`).
pub type SeriesTable = BTreeMap<String, Vec<f64>>;

/// Index of a variable in the registry's value buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub(crate) usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Instrument,
    Parameter,
    Endogenous,
}

/// Solve phase of an endogenous equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Evaluated once before the simultaneous block.
    Recursive,
    Simultaneous,
    /// Evaluated once after the simultaneous block has settled.
    Derived,
}

/// How the scenario/baseline difference of a variable is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImpactKind {
    /// `scenario - baseline`, in the variable's own unit.
    Absolute,
    /// `scenario / baseline - 1`. Baselines closer to zero than `floor` are
    /// replaced by `±floor` and the impact becomes `(scenario - baseline) / ±floor`.
    Relative { floor: f64 },
    /// `(scenario - baseline) * 100` for rates stored as fractions.
    PercentagePoint,
}

impl ImpactKind {
    pub fn impact(&self, baseline: f64, scenario: f64) -> f64 {
        match *self {
            ImpactKind::Absolute => scenario - baseline,
            ImpactKind::Relative { floor } => {
                if baseline.abs() >= floor {
                    scenario / baseline - 1.0
                } else {
                    let denominator = if baseline < 0.0 { -floor } else { floor };
                    (scenario - baseline) / denominator
                }
            }
            ImpactKind::PercentagePoint => (scenario - baseline) * 100.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactKind::Absolute => "absolute",
            ImpactKind::Relative { .. } => "relative",
            ImpactKind::PercentagePoint => "pp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    #[serde(rename = "CONVERGED")]
    Converged,
    #[serde(rename = "MAX_ITER")]
    MaxIter,
    #[serde(rename = "DIVERGED")]
    Diverged,
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConvergenceStatus::Converged => "CONVERGED",
            ConvergenceStatus::MaxIter => "MAX_ITER",
            ConvergenceStatus::Diverged => "DIVERGED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceRecord {
    pub year: Year,
    pub iterations: usize,
    pub max_residual: f64,
    pub status: ConvergenceStatus,
    /// Set when the year is flagged because an earlier year of the same run diverged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<Year>,
}

/// Resolved values of every registry variable for one year of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct YearState {
    pub year: Year,
    pub values: Vec<f64>,
}

impl YearState {
    pub fn new(year: Year, values: Vec<f64>) -> Self {
        Self { year, values }
    }

    pub fn get(&self, slot: Slot) -> f64 {
        self.values[slot.0]
    }

    pub fn set(&mut self, slot: Slot, value: f64) {
        self.values[slot.0] = value;
    }

    /// Copy of this state relabelled for the following year; the solver's starting point.
    pub fn carry_to(&self, year: Year) -> Self {
        Self {
            year,
            values: self.values.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyIndicators {
    pub years: Vec<Year>,
    pub gdp_growth: Vec<f64>,
    pub inflation: Vec<f64>,
    pub deficit_ratio: Vec<f64>,
    pub unemployment: Vec<f64>,
}

/// Outcome of a baseline-only request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineResult {
    pub indicators: KeyIndicators,
    pub convergence: Vec<ConvergenceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConvergence {
    pub baseline: Vec<ConvergenceRecord>,
    pub scenario: Vec<ConvergenceRecord>,
}

/// Complete outcome of one simulation request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub name: String,
    pub years: Vec<Year>,
    pub baseline: KeyIndicators,
    pub scenario: KeyIndicators,
    /// Scenario levels for every registry variable.
    pub levels: SeriesTable,
    pub baseline_levels: SeriesTable,
    pub impacts: SeriesTable,
    pub convergence: RunConvergence,
    pub instruments: InstrumentVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub relaxation: f64,
    /// Largest single-step change tolerated before a year is declared diverged.
    pub explosion_threshold: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 200,
            relaxation: 0.5,
            explosion_threshold: 1e12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!(
                "Unsupported export format '{}'. Valid formats: json, csv, xlsx",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_impact_is_exact_at_floor() {
        let kind = ImpactKind::Relative { floor: 0.5 };
        assert_eq!(kind.impact(0.5, 0.75), 0.75 / 0.5 - 1.0);
        assert_eq!(kind.impact(200.0, 210.0), 210.0 / 200.0 - 1.0);
    }

    #[test]
    fn test_relative_impact_below_floor_uses_signed_floor() {
        let kind = ImpactKind::Relative { floor: 1.0 };
        assert_eq!(kind.impact(0.0, 0.0), 0.0);
        assert_eq!(kind.impact(0.0, 0.5), 0.5);
        assert_eq!(kind.impact(-0.25, -0.75), 0.5);
    }

    #[test]
    fn test_percentage_point_and_absolute_impacts() {
        assert_eq!(ImpactKind::PercentagePoint.impact(0.08, 0.07), (0.07 - 0.08) * 100.0);
        assert_eq!(ImpactKind::Absolute.impact(0.0, 1000.0), 1000.0);
    }

    #[test]
    fn test_status_serializes_with_wire_names() {
        let json = serde_json::to_string(&ConvergenceStatus::MaxIter).unwrap();
        assert_eq!(json, "\"MAX_ITER\"");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
