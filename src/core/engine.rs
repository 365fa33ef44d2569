use crate::core::overlay::InstrumentOverlay;
use crate::core::parameters::{Calibration, ParameterStore};
use crate::core::trajectory::{build_run_result, TrajectoryOrchestrator};
use crate::domain::model::{BaselineResult, InstrumentVector, RunResult, SolverSettings};
use crate::domain::ports::ConfigProvider;
use crate::model::ml2::{self, EMBEDDED_CALIBRATION};
use crate::model::registry::{InstrumentSpec, ModelRegistry};
use crate::model::scalars::Ml2Scalars;
use crate::utils::error::Result;
use std::sync::Arc;

/// Process-wide entry point: holds the immutable registry and baseline
/// store, and serves any number of independent requests.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    store: ParameterStore,
    orchestrator: TrajectoryOrchestrator,
}

impl SimulationEngine {
    pub fn new(store: ParameterStore, settings: SolverSettings) -> Self {
        Self {
            store,
            orchestrator: TrajectoryOrchestrator::new(settings),
        }
    }

    /// ML2 engine; falls back to the embedded calibration.
    pub fn ml2(
        scalars: &Ml2Scalars,
        calibration: Option<&Calibration>,
        settings: SolverSettings,
    ) -> Result<Self> {
        let registry = Arc::new(ml2::build_registry(scalars)?);
        let store = match calibration {
            Some(calibration) => ParameterStore::load(registry, calibration)?,
            None => {
                let embedded = Calibration::from_toml_str(EMBEDDED_CALIBRATION)?;
                ParameterStore::load(registry, &embedded)?
            }
        };
        Ok(Self::new(store, settings))
    }

    pub fn from_config<C: ConfigProvider>(config: &C, scalars: &Ml2Scalars) -> Result<Self> {
        let calibration = match config.calibration_path() {
            Some(path) => {
                tracing::info!("Loading calibration from {}", path);
                Some(Calibration::from_file(path)?)
            }
            None => None,
        };
        Self::ml2(scalars, calibration.as_ref(), config.solver_settings())
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.store.registry()
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn settings(&self) -> SolverSettings {
        self.orchestrator.settings()
    }

    pub fn instrument_specs(&self) -> Vec<InstrumentSpec> {
        self.registry()
            .list_instruments()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn baseline(&self) -> Result<BaselineResult> {
        let view = self.store.baseline();
        let orchestrator = self.orchestrator;
        let trajectory = tokio::task::spawn_blocking(move || orchestrator.run(&view)).await?;
        Ok(BaselineResult {
            indicators: trajectory.indicators(self.registry()),
            convergence: trajectory.convergence,
        })
    }

    /// Validates the instrument vector, then solves baseline and scenario
    /// concurrently. A rejected vector solves nothing.
    pub async fn simulate(&self, name: &str, instruments: &InstrumentVector) -> Result<RunResult> {
        let scenario = InstrumentOverlay::new(&self.store).apply(instruments)?;
        let resolved = scenario.instrument_vector().clone();

        tracing::info!("Simulating '{}' with {} instrument override(s)", name, instruments.len());
        let (baseline, scenario) = self
            .orchestrator
            .run_pair(self.store.baseline(), scenario)
            .await?;

        Ok(build_run_result(name, self.registry(), &baseline, &scenario, resolved))
    }

    /// Same as [`simulate`](Self::simulate) on the calling thread.
    pub fn simulate_blocking(&self, name: &str, instruments: &InstrumentVector) -> Result<RunResult> {
        let scenario = InstrumentOverlay::new(&self.store).apply(instruments)?;
        let baseline = self.orchestrator.run(&self.store.baseline());
        let scenario_run = self.orchestrator.run(&scenario);
        Ok(build_run_result(
            name,
            self.registry(),
            &baseline,
            &scenario_run,
            scenario.instrument_vector().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::Ml2Error;

    fn engine() -> SimulationEngine {
        SimulationEngine::ml2(&Ml2Scalars::default(), None, SolverSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_baseline_covers_the_horizon() {
        let baseline = engine().baseline().await.unwrap();
        assert_eq!(baseline.indicators.years.len(), 8);
        assert_eq!(baseline.convergence.len(), 8);
    }

    #[tokio::test]
    async fn test_rejected_request_fails_fast() {
        let vector = InstrumentVector::from([("VIG_X".to_string(), 99999.0)]);
        let err = engine().simulate("too much", &vector).await.unwrap_err();
        assert!(matches!(err, Ml2Error::OutOfRange { .. }));
    }

    #[test]
    fn test_blocking_and_async_paths_agree() {
        let engine = engine();
        let vector = InstrumentVector::from([("NG_X".to_string(), 10.0)]);

        let blocking = engine.simulate_blocking("ng", &vector).unwrap();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let concurrent = runtime.block_on(engine.simulate("ng", &vector)).unwrap();

        assert_eq!(blocking, concurrent);
        assert_eq!(blocking.instruments["NG_X"], 10.0);
        assert_eq!(blocking.instruments.len(), 10);
    }
}
