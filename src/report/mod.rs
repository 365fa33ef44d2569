//! Reporting adapter: re-projects run results into response shapes and
//! export encodings. Nothing here computes model values.

pub mod csv_export;
pub mod exporter;
pub mod xlsx;

use crate::domain::model::{
    BaselineResult, ConvergenceRecord, ConvergenceStatus, ExportFormat, InstrumentVector,
    KeyIndicators, RunResult, SeriesTable, Year,
};
use crate::model::registry::{InstrumentSpec, ModelRegistry, Variable};
use crate::utils::error::{Ml2Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use exporter::FileExporter;

/// Variable -> year (as a string key) -> value.
pub type YearTable = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceEntry {
    pub year: Year,
    pub iterations: usize,
    /// `None` when the residual is not a finite number.
    pub max_residual: Option<f64>,
    pub status: ConvergenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<Year>,
}

impl From<&ConvergenceRecord> for ConvergenceEntry {
    fn from(record: &ConvergenceRecord) -> Self {
        Self {
            year: record.year,
            iterations: record.iterations,
            max_residual: record.max_residual.is_finite().then_some(record.max_residual),
            status: record.status,
            inherited_from: record.inherited_from,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineResponse {
    pub indicators: KeyIndicators,
    pub instruments: Vec<InstrumentSpec>,
    pub convergence: Vec<ConvergenceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResponse {
    pub name: String,
    pub years: Vec<Year>,
    pub baseline: KeyIndicators,
    pub scenario: KeyIndicators,
    pub impacts: YearTable,
    pub levels: YearTable,
    /// Scenario run, one entry per simulated year.
    pub convergence: Vec<ConvergenceEntry>,
    pub baseline_convergence: Vec<ConvergenceEntry>,
    pub instruments: InstrumentVector,
}

#[derive(Debug, Clone)]
pub struct ReportingAdapter {
    registry: Arc<ModelRegistry>,
}

impl ReportingAdapter {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn baseline_response(&self, baseline: &BaselineResult) -> BaselineResponse {
        BaselineResponse {
            indicators: baseline.indicators.clone(),
            instruments: self.registry.list_instruments().into_iter().cloned().collect(),
            convergence: baseline.convergence.iter().map(ConvergenceEntry::from).collect(),
        }
    }

    pub fn simulation_response(&self, result: &RunResult) -> Result<SimulationResponse> {
        Ok(SimulationResponse {
            name: result.name.clone(),
            years: result.years.clone(),
            baseline: result.baseline.clone(),
            scenario: result.scenario.clone(),
            impacts: self.year_table(&result.impacts, &result.years)?,
            levels: self.year_table(&result.levels, &result.years)?,
            convergence: result.convergence.scenario.iter().map(ConvergenceEntry::from).collect(),
            baseline_convergence: result
                .convergence
                .baseline
                .iter()
                .map(ConvergenceEntry::from)
                .collect(),
            instruments: result.instruments.clone(),
        })
    }

    pub fn encode(&self, result: &RunResult, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Json => {
                let response = self.simulation_response(result)?;
                Ok(serde_json::to_vec_pretty(&response)?)
            }
            ExportFormat::Csv => csv_export::to_csv(self, result),
            ExportFormat::Xlsx => xlsx::to_xlsx(self, result),
        }
    }

    /// Registry entry for a reported series; unknown keys cannot be labelled.
    pub(crate) fn variable(&self, key: &str) -> Result<&Variable> {
        self.registry.get_variable(key).map_err(|_| Ml2Error::ReportError {
            message: format!("variable {} is not mapped in the model registry", key),
        })
    }

    /// Looks up every series and checks it has one value per year.
    pub(crate) fn mapped_series<'r>(
        &self,
        table: &'r SeriesTable,
        years: &[Year],
    ) -> Result<Vec<(&Variable, &'r [f64])>> {
        table
            .iter()
            .map(|(key, series)| {
                let variable = self.variable(key)?;
                if series.len() != years.len() {
                    return Err(Ml2Error::ReportError {
                        message: format!(
                            "{} has {} values for {} years",
                            key,
                            series.len(),
                            years.len()
                        ),
                    });
                }
                Ok((variable, series.as_slice()))
            })
            .collect()
    }

    fn year_table(&self, table: &SeriesTable, years: &[Year]) -> Result<YearTable> {
        Ok(self
            .mapped_series(table, years)?
            .into_iter()
            .map(|(variable, series)| {
                let by_year = years
                    .iter()
                    .zip(series)
                    .map(|(year, value)| (year.to_string(), *value))
                    .collect();
                (variable.key.clone(), by_year)
            })
            .collect())
    }
}

/// Unit in which an impact series is expressed.
pub(crate) fn impact_unit(variable: &Variable) -> String {
    use crate::domain::model::ImpactKind;
    match variable.impact {
        ImpactKind::Absolute => variable.unit.clone(),
        ImpactKind::Relative { .. } => "relative".to_string(),
        ImpactKind::PercentagePoint => "pp".to_string(),
    }
}
