use crate::domain::model::{InstrumentVector, Slot, VariableKind, Year, YearState};
use crate::model::registry::ModelRegistry;
use crate::utils::error::{Ml2Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Exogenous path of one parameter over the simulated horizon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterPath {
    /// One value per simulated year.
    Values { values: Vec<f64> },
    /// Compounded from the seed value.
    Growth { growth: f64 },
}

/// Baseline calibration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Calibration {
    pub seed_year: Year,
    pub end_year: Year,
    pub seed: BTreeMap<String, f64>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterPath>,
}

impl Calibration {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Ml2Error::config(format!("Failed to parse calibration: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Ml2Error::config(format!(
                "Failed to read calibration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug)]
struct StoreData {
    registry: Arc<ModelRegistry>,
    seed: YearState,
    years: Vec<Year>,
    /// Indexed by slot; empty for anything that is not a parameter.
    paths: Vec<Vec<f64>>,
    defaults: InstrumentVector,
}

/// Immutable baseline calibration, shared by every request.
///
/// Cloning is cheap. Scenario runs never write into the store: they read
/// through a [`ParameterView`] carrying their own instrument values.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    inner: Arc<StoreData>,
}

impl ParameterStore {
    pub fn load(registry: Arc<ModelRegistry>, calibration: &Calibration) -> Result<Self> {
        let seed_year = calibration.seed_year;
        if calibration.end_year <= seed_year {
            return Err(Ml2Error::config(format!(
                "end_year {} must be after seed_year {}",
                calibration.end_year, seed_year
            )));
        }
        let years: Vec<Year> = (seed_year + 1..=calibration.end_year).collect();

        for (key, value) in &calibration.seed {
            let variable = registry
                .get_variable(key)
                .map_err(|_| Ml2Error::config(format!("Seed value for unknown variable {}", key)))?;
            if variable.kind == VariableKind::Instrument {
                return Err(Ml2Error::config(format!(
                    "Instrument {} is seeded from its declared default and cannot be calibrated",
                    key
                )));
            }
            if !value.is_finite() {
                return Err(Ml2Error::config(format!("Seed value for {} is not finite", key)));
            }
        }

        let mut seed = YearState::new(seed_year, vec![0.0; registry.len()]);
        let mut defaults = InstrumentVector::new();
        for variable in registry.variables() {
            match &variable.instrument {
                Some(spec) => {
                    seed.set(variable.slot, spec.default);
                    defaults.insert(spec.key.clone(), spec.default);
                }
                None => {
                    let value = calibration.seed.get(&variable.key).ok_or_else(|| {
                        Ml2Error::MissingParameter {
                            key: variable.key.clone(),
                            year: seed_year,
                        }
                    })?;
                    seed.set(variable.slot, *value);
                }
            }
        }

        for key in calibration.parameters.keys() {
            let variable = registry
                .get_variable(key)
                .map_err(|_| Ml2Error::config(format!("Path for unknown parameter {}", key)))?;
            if variable.kind != VariableKind::Parameter {
                return Err(Ml2Error::config(format!(
                    "{} is {:?}, only parameters take an exogenous path",
                    key, variable.kind
                )));
            }
        }

        let mut paths = vec![Vec::new(); registry.len()];
        for variable in registry.variables() {
            if variable.kind != VariableKind::Parameter {
                continue;
            }
            let path = calibration.parameters.get(&variable.key).ok_or_else(|| {
                Ml2Error::MissingParameter {
                    key: variable.key.clone(),
                    year: years[0],
                }
            })?;
            paths[variable.slot.index()] =
                resolve_path(&variable.key, path, seed.get(variable.slot), &years)?;
        }

        tracing::debug!(
            "Parameter store loaded: seed {}, {} simulated years, {} instruments",
            seed_year,
            years.len(),
            defaults.len()
        );

        Ok(Self {
            inner: Arc::new(StoreData {
                registry,
                seed,
                years,
                paths,
                defaults,
            }),
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.inner.registry
    }

    pub fn seed_year(&self) -> Year {
        self.inner.seed.year
    }

    /// Simulated years, seed year excluded.
    pub fn years(&self) -> &[Year] {
        &self.inner.years
    }

    pub fn value_at(&self, key: &str, year: Year) -> Result<f64> {
        self.baseline().value_at(key, year)
    }

    pub fn baseline(&self) -> ParameterView {
        ParameterView {
            store: self.clone(),
            instruments: Arc::new(self.inner.defaults.clone()),
        }
    }

    /// Independent view with the given instruments replaced; everything
    /// not mentioned keeps its declared default. Range checks belong to the
    /// instrument overlay.
    pub fn with_overrides(&self, overrides: &InstrumentVector) -> Result<ParameterView> {
        let mut instruments = self.inner.defaults.clone();
        for (key, value) in overrides {
            match instruments.get_mut(key) {
                Some(slot) => *slot = *value,
                None => {
                    return Err(Ml2Error::UnknownInstrument { key: key.clone() });
                }
            }
        }
        Ok(ParameterView {
            store: self.clone(),
            instruments: Arc::new(instruments),
        })
    }
}

fn resolve_path(key: &str, path: &ParameterPath, seed: f64, years: &[Year]) -> Result<Vec<f64>> {
    let values = match path {
        ParameterPath::Values { values } => {
            if values.len() < years.len() {
                return Err(Ml2Error::MissingParameter {
                    key: key.to_string(),
                    year: years[values.len()],
                });
            }
            if values.len() > years.len() {
                return Err(Ml2Error::config(format!(
                    "{} has {} values for a {}-year horizon",
                    key,
                    values.len(),
                    years.len()
                )));
            }
            values.clone()
        }
        ParameterPath::Growth { growth } => {
            let mut level = seed;
            years
                .iter()
                .map(|_| {
                    level *= 1.0 + growth;
                    level
                })
                .collect()
        }
    };

    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(Ml2Error::config(format!(
            "{} is not finite in {}",
            key, years[position]
        )));
    }
    Ok(values)
}

/// Read-only inputs of one run: the shared baseline plus this run's instruments.
#[derive(Debug, Clone)]
pub struct ParameterView {
    store: ParameterStore,
    instruments: Arc<InstrumentVector>,
}

impl ParameterView {
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.store.registry()
    }

    pub fn years(&self) -> &[Year] {
        self.store.years()
    }

    pub fn seed_state(&self) -> &YearState {
        &self.store.inner.seed
    }

    /// Fully resolved instrument vector, defaults filled in.
    pub fn instrument_vector(&self) -> &InstrumentVector {
        &self.instruments
    }

    pub fn value_at(&self, key: &str, year: Year) -> Result<f64> {
        let missing = || Ml2Error::MissingParameter {
            key: key.to_string(),
            year,
        };
        let data = &self.store.inner;
        let variable = data.registry.get_variable(key).map_err(|_| missing())?;

        if year == data.seed.year {
            return Ok(data.seed.get(variable.slot));
        }
        let index = self.year_index(year).ok_or_else(missing)?;
        match variable.kind {
            VariableKind::Instrument => self.instruments.get(key).copied().ok_or_else(missing),
            VariableKind::Parameter => Ok(data.paths[variable.slot.index()][index]),
            VariableKind::Endogenous => Err(missing()),
        }
    }

    fn year_index(&self, year: Year) -> Option<usize> {
        self.years().iter().position(|y| *y == year)
    }

    /// Writes this run's exogenous values for the `index`-th simulated year.
    pub fn write_inputs(&self, index: usize, state: &mut YearState) {
        let data = &self.store.inner;
        for variable in data.registry.variables() {
            match variable.kind {
                VariableKind::Parameter => {
                    state.set(variable.slot, data.paths[variable.slot.index()][index]);
                }
                VariableKind::Instrument => {
                    if let Some(value) = self.instruments.get(&variable.key) {
                        state.set(variable.slot, *value);
                    }
                }
                VariableKind::Endogenous => {}
            }
        }
    }

    pub fn slot(&self, key: &str) -> Result<Slot> {
        self.registry().slot(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ImpactKind, Phase};
    use crate::model::registry::{
        EquationType, IndicatorSlots, InstrumentSpec, RegistryBuilder, VariableDecl,
    };

    fn registry() -> Arc<ModelRegistry> {
        let mut b = RegistryBuilder::new();
        let g = b.instrument(InstrumentSpec {
            key: "G_X".to_string(),
            label: "Spending".to_string(),
            unit: "bn".to_string(),
            default: 1.0,
            min: 0.0,
            max: 10.0,
            description: String::new(),
        });
        let a = b.parameter(VariableDecl::new("A_", "index", ImpactKind::Relative { floor: 1e-9 }));
        let y = b.endogenous(VariableDecl::new("Y_", "bn", ImpactKind::Relative { floor: 1e-9 }));
        b.equation(y, Phase::Simultaneous, EquationType::Identity, &[a, g], move |f| {
            f.get(a) + f.get(g)
        });
        b.indicators(IndicatorSlots {
            output: y,
            prices: a,
            deficit_ratio: g,
            unemployment_rate: g,
        });
        Arc::new(b.build().unwrap())
    }

    const CALIBRATION: &str = r#"
seed_year = 2012
end_year = 2015

[seed]
A_ = 100.0
Y_ = 101.0

[parameters.A_]
growth = 0.1
"#;

    #[test]
    fn test_growth_path_compounds_from_seed() {
        let calibration = Calibration::from_toml_str(CALIBRATION).unwrap();
        let store = ParameterStore::load(registry(), &calibration).unwrap();

        assert_eq!(store.years(), &[2013, 2014, 2015]);
        assert_eq!(store.value_at("A_", 2012).unwrap(), 100.0);
        assert!((store.value_at("A_", 2014).unwrap() - 121.0).abs() < 1e-9);
        assert_eq!(store.value_at("G_X", 2015).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_year_or_key() {
        let calibration = Calibration::from_toml_str(CALIBRATION).unwrap();
        let store = ParameterStore::load(registry(), &calibration).unwrap();

        assert!(matches!(
            store.value_at("A_", 2030),
            Err(Ml2Error::MissingParameter { year: 2030, .. })
        ));
        assert!(matches!(
            store.value_at("Y_", 2013),
            Err(Ml2Error::MissingParameter { .. })
        ));
        assert!(matches!(
            store.value_at("NOPE_", 2013),
            Err(Ml2Error::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_overrides_do_not_touch_the_baseline() {
        let calibration = Calibration::from_toml_str(CALIBRATION).unwrap();
        let store = ParameterStore::load(registry(), &calibration).unwrap();

        let overrides = InstrumentVector::from([("G_X".to_string(), 5.0)]);
        let scenario = store.with_overrides(&overrides).unwrap();

        assert_eq!(scenario.value_at("G_X", 2013).unwrap(), 5.0);
        // the seed year always carries the declared default
        assert_eq!(scenario.value_at("G_X", 2012).unwrap(), 1.0);
        assert_eq!(store.value_at("G_X", 2013).unwrap(), 1.0);
        assert_eq!(store.baseline().instrument_vector()["G_X"], 1.0);
    }

    #[test]
    fn test_override_of_non_instrument_is_rejected() {
        let calibration = Calibration::from_toml_str(CALIBRATION).unwrap();
        let store = ParameterStore::load(registry(), &calibration).unwrap();

        let overrides = InstrumentVector::from([("A_".to_string(), 5.0)]);
        assert!(matches!(
            store.with_overrides(&overrides),
            Err(Ml2Error::UnknownInstrument { .. })
        ));
    }

    #[test]
    fn test_short_values_path_is_a_missing_parameter() {
        let text = CALIBRATION.replace("growth = 0.1", "values = [1.0, 2.0]");
        let calibration = Calibration::from_toml_str(&text).unwrap();
        let err = ParameterStore::load(registry(), &calibration).unwrap_err();
        assert!(matches!(err, Ml2Error::MissingParameter { year: 2015, .. }));
    }

    #[test]
    fn test_missing_seed_value_is_fatal() {
        let text = CALIBRATION.replace("Y_ = 101.0", "");
        let calibration = Calibration::from_toml_str(&text).unwrap();
        assert!(ParameterStore::load(registry(), &calibration).is_err());
    }

    #[test]
    fn test_seeding_an_instrument_is_rejected() {
        let text = CALIBRATION.replace("Y_ = 101.0", "Y_ = 101.0\nG_X = 3.0");
        let calibration = Calibration::from_toml_str(&text).unwrap();
        let err = ParameterStore::load(registry(), &calibration).unwrap_err();
        assert!(err.to_string().contains("G_X"));
    }

    #[test]
    fn test_horizon_must_be_positive() {
        let text = CALIBRATION.replace("end_year = 2015", "end_year = 2012");
        let calibration = Calibration::from_toml_str(&text).unwrap();
        assert!(matches!(
            ParameterStore::load(registry(), &calibration),
            Err(Ml2Error::ConfigError { .. })
        ));
    }

    #[test]
    fn test_write_inputs_fills_exogenous_slots() {
        let calibration = Calibration::from_toml_str(CALIBRATION).unwrap();
        let store = ParameterStore::load(registry(), &calibration).unwrap();
        let view = store
            .with_overrides(&InstrumentVector::from([("G_X".to_string(), 7.0)]))
            .unwrap();

        let mut state = view.seed_state().carry_to(2013);
        view.write_inputs(0, &mut state);

        assert_eq!(state.get(view.slot("G_X").unwrap()), 7.0);
        assert!((state.get(view.slot("A_").unwrap()) - 110.0).abs() < 1e-9);
        // endogenous values are carried, not overwritten
        assert_eq!(state.get(view.slot("Y_").unwrap()), 101.0);
    }
}
