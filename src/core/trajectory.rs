use crate::core::parameters::ParameterView;
use crate::core::solver::YearSolver;
use crate::domain::model::{
    ConvergenceRecord, ConvergenceStatus, InstrumentVector, KeyIndicators, RunConvergence,
    RunResult, SeriesTable, Slot, SolverSettings, Year, YearState,
};
use crate::model::frame::growth_rate;
use crate::model::registry::ModelRegistry;
use crate::utils::error::Result;

/// Solved years of one run, seed year first.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub states: Vec<YearState>,
    pub convergence: Vec<ConvergenceRecord>,
}

impl Trajectory {
    pub fn years(&self) -> Vec<Year> {
        self.simulated().iter().map(|state| state.year).collect()
    }

    pub fn simulated(&self) -> &[YearState] {
        &self.states[1..]
    }

    /// Dashboard indicators; growth rates are taken against the previous
    /// solved year, the seed year for the first one.
    pub fn indicators(&self, registry: &ModelRegistry) -> KeyIndicators {
        let slots = registry.indicators();
        let growth = |slot: Slot| -> Vec<f64> {
            self.states
                .windows(2)
                .map(|pair| growth_rate(pair[1].get(slot), pair[0].get(slot)))
                .collect()
        };
        let percent = |slot: Slot| -> Vec<f64> {
            self.simulated()
                .iter()
                .map(|state| state.get(slot) * 100.0)
                .collect()
        };

        KeyIndicators {
            years: self.years(),
            gdp_growth: growth(slots.output),
            inflation: growth(slots.prices),
            deficit_ratio: percent(slots.deficit_ratio),
            unemployment: percent(slots.unemployment_rate),
        }
    }

    fn levels(&self, registry: &ModelRegistry) -> SeriesTable {
        registry
            .variables()
            .iter()
            .map(|variable| {
                let series = self
                    .simulated()
                    .iter()
                    .map(|state| state.get(variable.slot))
                    .collect();
                (variable.key.clone(), series)
            })
            .collect()
    }
}

/// Drives the year solver across the horizon, one year after the other.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryOrchestrator {
    settings: SolverSettings,
}

impl TrajectoryOrchestrator {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> SolverSettings {
        self.settings
    }

    /// Each year starts from the previous year's solution with this year's
    /// exogenous inputs written over it. Once a year diverges, every later
    /// year is still solved but reported as diverged.
    pub fn run(&self, view: &ParameterView) -> Trajectory {
        let registry = view.registry();
        let solver = YearSolver::new(registry, self.settings);

        let mut states = Vec::with_capacity(view.years().len() + 1);
        states.push(view.seed_state().clone());
        let mut convergence = Vec::with_capacity(view.years().len());
        let mut diverged_at: Option<Year> = None;

        for (index, &year) in view.years().iter().enumerate() {
            let mut state = states[states.len() - 1].carry_to(year);
            view.write_inputs(index, &mut state);

            let mut record = solver.solve(&mut state, &states);
            match diverged_at {
                Some(origin) => {
                    tracing::warn!("Year {} flagged DIVERGED, inherited from {}", year, origin);
                    record.status = ConvergenceStatus::Diverged;
                    record.inherited_from = Some(origin);
                }
                None if record.status == ConvergenceStatus::Diverged => diverged_at = Some(year),
                None => {}
            }

            states.push(state);
            convergence.push(record);
        }

        let converged = convergence
            .iter()
            .filter(|r| r.status == ConvergenceStatus::Converged)
            .count();
        tracing::info!(
            "Trajectory solved: {} years, {} converged",
            convergence.len(),
            converged
        );

        Trajectory {
            states,
            convergence,
        }
    }

    /// Baseline and scenario share nothing mutable, so they run as two blocking tasks.
    pub async fn run_pair(
        &self,
        baseline: ParameterView,
        scenario: ParameterView,
    ) -> Result<(Trajectory, Trajectory)> {
        let orchestrator = *self;
        let baseline_task = tokio::task::spawn_blocking(move || orchestrator.run(&baseline));
        let scenario_task = tokio::task::spawn_blocking(move || orchestrator.run(&scenario));

        let (baseline, scenario) = tokio::try_join!(baseline_task, scenario_task)?;
        Ok((baseline, scenario))
    }
}

/// Combines both halves of a request into its result. Impacts follow each
/// variable's declared impact kind.
pub fn build_run_result(
    name: &str,
    registry: &ModelRegistry,
    baseline: &Trajectory,
    scenario: &Trajectory,
    instruments: InstrumentVector,
) -> RunResult {
    let impacts = registry
        .variables()
        .iter()
        .map(|variable| {
            let series = baseline
                .simulated()
                .iter()
                .zip(scenario.simulated())
                .map(|(b, s)| variable.impact.impact(b.get(variable.slot), s.get(variable.slot)))
                .collect();
            (variable.key.clone(), series)
        })
        .collect();

    RunResult {
        name: name.to_string(),
        years: scenario.years(),
        baseline: baseline.indicators(registry),
        scenario: scenario.indicators(registry),
        levels: scenario.levels(registry),
        baseline_levels: baseline.levels(registry),
        impacts,
        convergence: RunConvergence {
            baseline: baseline.convergence.clone(),
            scenario: scenario.convergence.clone(),
        },
        instruments,
    }
}
