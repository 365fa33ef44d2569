use crate::domain::model::{ConvergenceRecord, ConvergenceStatus, SolverSettings, Year, YearState};
use crate::model::frame::Frame;
use crate::model::registry::{Equation, ModelRegistry};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Solves one year of one run.
///
/// The recursive block is evaluated once, the simultaneous block is iterated
/// Gauss-Seidel style, then the derived block is evaluated once. The year's
/// values live in a single buffer (`state.values`): within a pass every
/// equation reads whatever is in the buffer at that moment, including values
/// written earlier in the same pass. Each update is under-relaxed,
/// `new = r * computed + (1 - r) * old`, and measured as
/// `|new - old| / max(|old|, 1)`.
///
/// Non-convergence is never an error; the outcome is always a labelled
/// [`ConvergenceRecord`].
pub struct YearSolver<'a> {
    registry: &'a ModelRegistry,
    settings: SolverSettings,
}

enum Pass {
    Settled(f64),
    Diverged(f64),
}

impl<'a> YearSolver<'a> {
    pub fn new(registry: &'a ModelRegistry, settings: SolverSettings) -> Self {
        Self { registry, settings }
    }

    /// `state` arrives seeded with the previous year's solution and this
    /// year's exogenous inputs; `history` holds the solved years of the run,
    /// seed first.
    pub fn solve(&self, state: &mut YearState, history: &[YearState]) -> ConvergenceRecord {
        let year = state.year;

        for equation in self.registry.recursive() {
            match evaluate(equation, year, &state.values, history) {
                Some(value) => state.set(equation.target(), value),
                None => {
                    self.log_failure(year, equation);
                    return self.record(year, 0, f64::INFINITY, ConvergenceStatus::Diverged);
                }
            }
        }

        let mut backup = state.values.clone();
        let mut iterations = 0;
        let mut max_residual = 0.0;
        let mut status = ConvergenceStatus::MaxIter;

        while iterations < self.settings.max_iterations {
            iterations += 1;
            match self.pass(state, history) {
                Pass::Settled(residual) => max_residual = residual,
                Pass::Diverged(residual) => {
                    // back to the last complete pass
                    state.values.copy_from_slice(&backup);
                    return self.record(year, iterations, residual, ConvergenceStatus::Diverged);
                }
            }
            backup.copy_from_slice(&state.values);

            if max_residual <= self.settings.tolerance {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        for equation in self.registry.derived() {
            match evaluate(equation, year, &state.values, history) {
                Some(value) => state.set(equation.target(), value),
                None => {
                    self.log_failure(year, equation);
                    status = ConvergenceStatus::Diverged;
                }
            }
        }

        self.record(year, iterations, max_residual, status)
    }

    fn pass(&self, state: &mut YearState, history: &[YearState]) -> Pass {
        let relaxation = self.settings.relaxation;
        let mut max_residual: f64 = 0.0;

        for equation in self.registry.simultaneous() {
            let slot = equation.target();
            let old = state.get(slot);

            let Some(computed) = evaluate(equation, state.year, &state.values, history) else {
                self.log_failure(state.year, equation);
                return Pass::Diverged(f64::INFINITY);
            };

            let new = relaxation * computed + (1.0 - relaxation) * old;
            let step = (new - old).abs();
            let residual = step / old.abs().max(1.0);
            if !new.is_finite() || step > self.settings.explosion_threshold {
                tracing::debug!(
                    "Year {}: {} exploded ({} -> {})",
                    state.year,
                    self.registry.variable(slot).key,
                    old,
                    new
                );
                let residual = if residual.is_finite() { residual } else { f64::INFINITY };
                return Pass::Diverged(residual);
            }

            state.set(slot, new);
            max_residual = max_residual.max(residual);
        }

        Pass::Settled(max_residual)
    }

    fn record(
        &self,
        year: Year,
        iterations: usize,
        max_residual: f64,
        status: ConvergenceStatus,
    ) -> ConvergenceRecord {
        match status {
            ConvergenceStatus::Converged => tracing::debug!(
                "Year {}: {} iterations, max residual={:.3e}, status={}",
                year,
                iterations,
                max_residual,
                status
            ),
            _ => tracing::warn!(
                "Year {}: {} after {} iterations (max residual={:.3e})",
                year,
                status,
                iterations,
                max_residual
            ),
        }

        ConvergenceRecord {
            year,
            iterations,
            max_residual,
            status,
            inherited_from: None,
        }
    }

    fn log_failure(&self, year: Year, equation: &Equation) {
        tracing::warn!(
            "Year {}: equation for {} produced no finite value",
            year,
            self.registry.variable(equation.target()).key
        );
    }
}

/// Runs one equation; a panic or a non-finite result yields `None`.
fn evaluate(equation: &Equation, year: Year, values: &[f64], history: &[YearState]) -> Option<f64> {
    let frame = Frame::new(year, values, history);
    catch_unwind(AssertUnwindSafe(|| equation.evaluate(&frame)))
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ImpactKind, Phase, Slot};
    use crate::model::registry::{EquationType, IndicatorSlots, RegistryBuilder, VariableDecl};

    fn decl(key: &str) -> VariableDecl {
        VariableDecl::new(key, "units", ImpactKind::Absolute)
    }

    fn build(
        define: impl FnOnce(&mut RegistryBuilder, Slot, Slot),
    ) -> ModelRegistry {
        let mut b = RegistryBuilder::new();
        let a = b.endogenous(decl("A_"));
        let c = b.endogenous(decl("B_"));
        define(&mut b, a, c);
        b.indicators(IndicatorSlots {
            output: a,
            prices: a,
            deficit_ratio: c,
            unemployment_rate: c,
        });
        b.build().unwrap()
    }

    fn settings(relaxation: f64, max_iterations: usize) -> SolverSettings {
        SolverSettings {
            relaxation,
            max_iterations,
            ..SolverSettings::default()
        }
    }

    fn seed() -> Vec<YearState> {
        vec![YearState::new(2012, vec![0.0, 0.0])]
    }

    #[test]
    fn test_later_equations_see_updates_from_the_same_pass() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Simultaneous, EquationType::Identity, &[], |_| 5.0);
            b.equation(c, Phase::Simultaneous, EquationType::Identity, &[a], move |f| f.get(a));
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, settings(1.0, 50)).solve(&mut state, &history);

        // Gauss-Seidel settles after one productive pass plus one confirming pass.
        assert_eq!(record.status, ConvergenceStatus::Converged);
        assert_eq!(record.iterations, 2);
        assert_eq!(state.values, vec![5.0, 5.0]);
    }

    #[test]
    fn test_relaxed_fixed_point_converges_within_tolerance() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Simultaneous, EquationType::Behavioral, &[c], move |f| {
                0.5 * f.get(c) + 10.0
            });
            b.equation(c, Phase::Simultaneous, EquationType::Identity, &[a], move |f| {
                0.5 * f.get(a)
            });
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, SolverSettings::default()).solve(&mut state, &history);

        assert_eq!(record.status, ConvergenceStatus::Converged);
        assert!(record.max_residual <= 1e-6);
        assert!((state.values[0] - 40.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_oscillation_hits_the_iteration_cap() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Simultaneous, EquationType::Behavioral, &[], move |f| {
                1.0 - f.get(a)
            });
            b.equation(c, Phase::Derived, EquationType::Identity, &[a], move |f| f.get(a));
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, settings(1.0, 7)).solve(&mut state, &history);

        assert_eq!(record.status, ConvergenceStatus::MaxIter);
        assert_eq!(record.iterations, 7);
        // last iterate is kept, and the derived block still ran
        assert_eq!(state.values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_non_finite_value_diverges_and_keeps_last_pass() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Simultaneous, EquationType::Behavioral, &[], move |f| {
                f.get(a) + 1.0
            });
            b.equation(c, Phase::Simultaneous, EquationType::Identity, &[a], move |f| {
                if f.get(a) > 2.5 {
                    f64::NAN
                } else {
                    f.get(a)
                }
            });
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, settings(1.0, 50)).solve(&mut state, &history);

        assert_eq!(record.status, ConvergenceStatus::Diverged);
        assert_eq!(record.iterations, 3);
        assert_eq!(record.max_residual, f64::INFINITY);
        assert_eq!(state.values, vec![2.0, 2.0]);
    }

    #[test]
    fn test_panicking_equation_is_reported_as_diverged() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Recursive, EquationType::Technical, &[], |_| 1.0);
            b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |f| {
                let divisor = f.year() - 2013;
                f64::from(10 / divisor)
            });
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, SolverSettings::default()).solve(&mut state, &history);

        assert_eq!(record.status, ConvergenceStatus::Diverged);
        assert!(state.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_explosion_threshold_applies_to_the_raw_step() {
        let registry = build(|b, a, c| {
            b.equation(a, Phase::Simultaneous, EquationType::Behavioral, &[], |_| 1e20);
            b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |_| 0.0);
        });
        let history = seed();
        let mut state = history[0].carry_to(2013);

        let record = YearSolver::new(&registry, SolverSettings::default()).solve(&mut state, &history);

        assert_eq!(record.status, ConvergenceStatus::Diverged);
        assert_eq!(record.iterations, 1);
        assert!(record.max_residual > 1e12);
        assert_eq!(state.values, vec![0.0, 0.0]);
    }
}
