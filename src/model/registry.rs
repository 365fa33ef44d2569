use crate::domain::model::{ImpactKind, Phase, Slot, VariableKind};
use crate::model::frame::Frame;
use crate::utils::error::{Ml2Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type EquationFn = Arc<dyn Fn(&Frame<'_>) -> f64 + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationType {
    Identity,
    Behavioral,
    Technical,
}

/// Declared range and presentation of a policy instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub key: String,
    pub kind: VariableKind,
    pub unit: String,
    pub description: String,
    pub impact: ImpactKind,
    pub slot: Slot,
    pub instrument: Option<InstrumentSpec>,
    /// Index of the defining equation in evaluation order (endogenous only).
    pub equation: Option<usize>,
}

/// Declaration of a non-instrument variable.
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub key: String,
    pub unit: String,
    pub description: String,
    pub impact: ImpactKind,
}

impl VariableDecl {
    pub fn new(key: &str, unit: &str, impact: ImpactKind) -> Self {
        Self {
            key: key.to_string(),
            unit: unit.to_string(),
            description: String::new(),
            impact,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

#[derive(Clone)]
pub struct Equation {
    target: Slot,
    phase: Phase,
    kind: EquationType,
    inputs: Vec<Slot>,
    compute: EquationFn,
}

impl Equation {
    pub fn target(&self) -> Slot {
        self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn kind(&self) -> EquationType {
        self.kind
    }

    pub fn inputs(&self) -> &[Slot] {
        &self.inputs
    }

    pub fn evaluate(&self, frame: &Frame<'_>) -> f64 {
        (self.compute)(frame)
    }
}

impl fmt::Debug for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equation")
            .field("target", &self.target)
            .field("phase", &self.phase)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Variables feeding the dashboard's key indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSlots {
    /// Real output level; reported as year-over-year growth.
    pub output: Slot,
    /// Price index; reported as year-over-year growth.
    pub prices: Slot,
    /// Deficit ratio stored as a fraction; reported in percent.
    pub deficit_ratio: Slot,
    /// Unemployment rate stored as a fraction; reported in percent.
    pub unemployment_rate: Slot,
}

/// Static model definition, resolved once into slot-indexed arrays.
///
/// Equations are held in evaluation order: by phase, then in the order their
/// target variables were declared. That order is part of the model and is
/// what makes Gauss-Seidel runs reproducible.
#[derive(Debug)]
pub struct ModelRegistry {
    variables: Vec<Variable>,
    index: HashMap<String, Slot>,
    equations: Vec<Equation>,
    simultaneous_start: usize,
    derived_start: usize,
    instruments: Vec<Slot>,
    indicators: IndicatorSlots,
}

impl ModelRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get_variable(&self, key: &str) -> Result<&Variable> {
        self.slot(key).map(|slot| &self.variables[slot.index()])
    }

    pub fn slot(&self, key: &str) -> Result<Slot> {
        self.index.get(key).copied().ok_or_else(|| Ml2Error::NotFound {
            key: key.to_string(),
        })
    }

    pub fn variable(&self, slot: Slot) -> &Variable {
        &self.variables[slot.index()]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn list_instruments(&self) -> Vec<&InstrumentSpec> {
        self.instruments
            .iter()
            .filter_map(|slot| self.variables[slot.index()].instrument.as_ref())
            .collect()
    }

    pub fn equations_in_dependency_order(&self) -> &[Equation] {
        &self.equations
    }

    pub fn recursive(&self) -> &[Equation] {
        &self.equations[..self.simultaneous_start]
    }

    pub fn simultaneous(&self) -> &[Equation] {
        &self.equations[self.simultaneous_start..self.derived_start]
    }

    pub fn derived(&self) -> &[Equation] {
        &self.equations[self.derived_start..]
    }

    pub fn indicators(&self) -> IndicatorSlots {
        self.indicators
    }
}

/// Collects declarations and equations, then validates them as a whole.
///
/// Declaration problems (duplicate keys, unknown references) are recorded
/// and reported together by [`RegistryBuilder::build`], so a malformed model
/// fails at load time rather than during a simulation.
#[derive(Default)]
pub struct RegistryBuilder {
    variables: Vec<Variable>,
    index: HashMap<String, Slot>,
    equations: Vec<Equation>,
    indicators: Option<IndicatorSlots>,
    problems: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instrument(&mut self, spec: InstrumentSpec) -> Slot {
        let decl = VariableDecl {
            key: spec.key.clone(),
            unit: spec.unit.clone(),
            description: spec.description.clone(),
            impact: ImpactKind::Absolute,
        };
        self.declare(decl, VariableKind::Instrument, Some(spec))
    }

    pub fn parameter(&mut self, decl: VariableDecl) -> Slot {
        self.declare(decl, VariableKind::Parameter, None)
    }

    pub fn endogenous(&mut self, decl: VariableDecl) -> Slot {
        self.declare(decl, VariableKind::Endogenous, None)
    }

    fn declare(
        &mut self,
        decl: VariableDecl,
        kind: VariableKind,
        instrument: Option<InstrumentSpec>,
    ) -> Slot {
        if let Some(existing) = self.index.get(&decl.key) {
            self.problems
                .push(format!("duplicate variable key {}", decl.key));
            return *existing;
        }

        let slot = Slot(self.variables.len());
        self.index.insert(decl.key.clone(), slot);
        self.variables.push(Variable {
            key: decl.key,
            kind,
            unit: decl.unit,
            description: decl.description,
            impact: decl.impact,
            slot,
            instrument,
            equation: None,
        });
        slot
    }

    /// Looks up a declared variable for use inside an equation.
    pub fn resolve(&self, key: &str) -> Result<Slot> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| Ml2Error::config(format!("equation references unknown variable {}", key)))
    }

    pub fn equation<F>(
        &mut self,
        target: Slot,
        phase: Phase,
        kind: EquationType,
        inputs: &[Slot],
        compute: F,
    ) -> &mut Self
    where
        F: Fn(&Frame<'_>) -> f64 + Send + Sync + 'static,
    {
        self.equations.push(Equation {
            target,
            phase,
            kind,
            inputs: inputs.to_vec(),
            compute: Arc::new(compute),
        });
        self
    }

    pub fn indicators(&mut self, slots: IndicatorSlots) -> &mut Self {
        self.indicators = Some(slots);
        self
    }

    pub fn build(self) -> Result<ModelRegistry> {
        let RegistryBuilder {
            mut variables,
            index,
            mut equations,
            indicators,
            mut problems,
        } = self;

        let in_range = |slot: Slot| slot.index() < variables.len();

        for variable in &variables {
            match variable.impact {
                ImpactKind::Relative { floor } if !(floor.is_finite() && floor > 0.0) => {
                    problems.push(format!(
                        "{} declares a relative impact with non-positive floor {}",
                        variable.key, floor
                    ));
                }
                _ => {}
            }
            if let Some(spec) = &variable.instrument {
                let finite = spec.min.is_finite() && spec.max.is_finite() && spec.default.is_finite();
                if !finite || spec.min > spec.max || spec.default < spec.min || spec.default > spec.max {
                    problems.push(format!(
                        "instrument {} has an inconsistent range [{}, {}] with default {}",
                        spec.key, spec.min, spec.max, spec.default
                    ));
                }
            }
        }

        let mut defined = vec![0usize; variables.len()];
        for equation in &equations {
            if !in_range(equation.target) {
                problems.push(format!("equation targets unknown slot {}", equation.target.index()));
                continue;
            }
            let target = &variables[equation.target.index()];
            if target.kind != VariableKind::Endogenous {
                problems.push(format!(
                    "{} is {:?} and cannot have a defining equation",
                    target.key, target.kind
                ));
            }
            defined[equation.target.index()] += 1;
            for input in &equation.inputs {
                if !in_range(*input) {
                    problems.push(format!(
                        "equation for {} references unknown slot {}",
                        target.key,
                        input.index()
                    ));
                }
            }
        }

        for variable in &variables {
            let count = defined[variable.slot.index()];
            if variable.kind == VariableKind::Endogenous && count != 1 {
                problems.push(format!(
                    "endogenous variable {} has {} defining equations (expected exactly one)",
                    variable.key, count
                ));
            }
        }

        let indicators = match indicators {
            Some(slots) => {
                for slot in [
                    slots.output,
                    slots.prices,
                    slots.deficit_ratio,
                    slots.unemployment_rate,
                ] {
                    if !in_range(slot) {
                        problems.push(format!("indicator references unknown slot {}", slot.index()));
                    }
                }
                Some(slots)
            }
            None => {
                problems.push("key indicator variables are not declared".to_string());
                None
            }
        };

        if !problems.is_empty() {
            return Err(Ml2Error::config(format!(
                "malformed model registry: {}",
                problems.join("; ")
            )));
        }

        // Stable: within a phase, evaluation follows variable declaration order.
        equations.sort_by_key(|eq| (eq.phase, eq.target));
        for (position, equation) in equations.iter().enumerate() {
            variables[equation.target.index()].equation = Some(position);
        }

        let simultaneous_start = equations
            .iter()
            .position(|eq| eq.phase != Phase::Recursive)
            .unwrap_or(equations.len());
        let derived_start = equations
            .iter()
            .position(|eq| eq.phase == Phase::Derived)
            .unwrap_or(equations.len());

        let instruments = variables
            .iter()
            .filter(|v| v.kind == VariableKind::Instrument)
            .map(|v| v.slot)
            .collect();

        tracing::debug!(
            "Model registry built: {} variables, {} equations ({} simultaneous)",
            variables.len(),
            equations.len(),
            derived_start - simultaneous_start
        );

        Ok(ModelRegistry {
            variables,
            index,
            equations,
            simultaneous_start,
            derived_start,
            instruments,
            // checked above: a missing declaration is a recorded problem
            indicators: indicators.ok_or_else(|| Ml2Error::config("key indicators missing"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(key: &str) -> VariableDecl {
        VariableDecl::new(key, "bn EUR", ImpactKind::Relative { floor: 1e-9 })
    }

    fn small_builder() -> (RegistryBuilder, Slot, Slot, Slot) {
        let mut b = RegistryBuilder::new();
        let g = b.instrument(InstrumentSpec {
            key: "G_X".to_string(),
            label: "Spending".to_string(),
            unit: "bn EUR".to_string(),
            default: 0.0,
            min: -10.0,
            max: 10.0,
            description: "Extra spending".to_string(),
        });
        let c = b.endogenous(level("C_"));
        let y = b.endogenous(level("Y_"));
        b.indicators(IndicatorSlots {
            output: y,
            prices: y,
            deficit_ratio: g,
            unemployment_rate: g,
        });
        (b, g, c, y)
    }

    #[test]
    fn test_build_orders_equations_by_phase_then_declaration() {
        let (mut b, g, c, y) = small_builder();
        b.equation(y, Phase::Simultaneous, EquationType::Identity, &[c, g], move |f| {
            f.get(c) + f.get(g)
        });
        b.equation(c, Phase::Simultaneous, EquationType::Behavioral, &[y], move |f| {
            0.5 * f.get(y)
        });

        let registry = b.build().unwrap();
        let order: Vec<Slot> = registry
            .equations_in_dependency_order()
            .iter()
            .map(|eq| eq.target())
            .collect();
        assert_eq!(order, vec![c, y]);
        assert_eq!(registry.simultaneous().len(), 2);
        assert!(registry.recursive().is_empty());
        assert_eq!(registry.get_variable("Y_").unwrap().equation, Some(1));
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let (mut b, _, c, y) = small_builder();
        b.endogenous(level("C_"));
        b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);
        b.equation(y, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);

        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("duplicate variable key C_"));
    }

    #[test]
    fn test_missing_equation_is_fatal() {
        let (mut b, _, c, _) = small_builder();
        b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);

        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("Y_ has 0 defining equations"));
    }

    #[test]
    fn test_unknown_reference_is_fatal() {
        let (b, _, _, _) = small_builder();
        let err = b.resolve("K_").unwrap_err();
        assert!(err.to_string().contains("unknown variable K_"));
    }

    #[test]
    fn test_equation_on_instrument_is_rejected() {
        let (mut b, g, c, y) = small_builder();
        b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);
        b.equation(y, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);
        b.equation(g, Phase::Recursive, EquationType::Technical, &[], |_| 1.0);

        assert!(b.build().is_err());
    }

    #[test]
    fn test_relative_impact_needs_positive_floor() {
        let (mut b, _, c, y) = small_builder();
        let z = b.endogenous(VariableDecl::new("Z_", "index", ImpactKind::Relative { floor: 0.0 }));
        for slot in [c, y, z] {
            b.equation(slot, Phase::Derived, EquationType::Identity, &[], |_| 1.0);
        }

        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("non-positive floor"));
    }

    #[test]
    fn test_lookup_and_instrument_listing() {
        let (mut b, _, c, y) = small_builder();
        b.equation(c, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);
        b.equation(y, Phase::Simultaneous, EquationType::Identity, &[], |_| 1.0);
        let registry = b.build().unwrap();

        assert!(matches!(registry.get_variable("NOPE_"), Err(Ml2Error::NotFound { .. })));
        let instruments = registry.list_instruments();
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].key, "G_X");
    }
}
