use crate::core::parameters::{ParameterStore, ParameterView};
use crate::domain::model::InstrumentVector;
use crate::utils::error::{Ml2Error, Result};

/// Validates a caller's instrument vector and turns it into a scenario view.
///
/// Values are never clamped. Any rejection happens here, before a single
/// year is solved.
pub struct InstrumentOverlay<'a> {
    store: &'a ParameterStore,
}

impl<'a> InstrumentOverlay<'a> {
    pub fn new(store: &'a ParameterStore) -> Self {
        Self { store }
    }

    pub fn validate(&self, vector: &InstrumentVector) -> Result<()> {
        let registry = self.store.registry();
        for (key, value) in vector {
            let spec = registry
                .get_variable(key)
                .ok()
                .and_then(|variable| variable.instrument.as_ref())
                .ok_or_else(|| Ml2Error::UnknownInstrument { key: key.clone() })?;

            if !value.is_finite() || *value < spec.min || *value > spec.max {
                return Err(Ml2Error::OutOfRange {
                    key: key.clone(),
                    value: *value,
                    min: spec.min,
                    max: spec.max,
                });
            }
        }
        Ok(())
    }

    pub fn apply(&self, vector: &InstrumentVector) -> Result<ParameterView> {
        self.validate(vector)?;
        self.store.with_overrides(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ml2::{build_registry, EMBEDDED_CALIBRATION};
    use crate::model::scalars::Ml2Scalars;
    use crate::core::parameters::Calibration;
    use std::sync::Arc;

    fn store() -> ParameterStore {
        let registry = Arc::new(build_registry(&Ml2Scalars::default()).unwrap());
        let calibration = Calibration::from_toml_str(EMBEDDED_CALIBRATION).unwrap();
        ParameterStore::load(registry, &calibration).unwrap()
    }

    #[test]
    fn test_unlisted_instruments_take_defaults() {
        let store = store();
        let view = InstrumentOverlay::new(&store)
            .apply(&InstrumentVector::from([("VIG_X".to_string(), 1000.0)]))
            .unwrap();

        let resolved = view.instrument_vector();
        assert_eq!(resolved.len(), 10);
        assert_eq!(resolved["VIG_X"], 1000.0);
        assert_eq!(resolved["ITPC0R_X"], 21.0);
        assert_eq!(resolved["CSSFR_X"], 30.0);
    }

    #[test]
    fn test_out_of_range_reports_key_and_bounds() {
        let store = store();
        let err = InstrumentOverlay::new(&store)
            .apply(&InstrumentVector::from([("ITPC0R_X".to_string(), 500.0)]))
            .unwrap_err();

        assert_eq!(err.to_string(), "ITPC0R_X: 500 out of range [15, 27]");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let store = store();
        let overlay = InstrumentOverlay::new(&store);
        let vector = InstrumentVector::from([
            ("ZX_X".to_string(), -2.0),
            ("VIG_X".to_string(), 6000.0),
        ]);
        assert!(overlay.apply(&vector).is_ok());
    }

    #[test]
    fn test_unknown_and_non_instrument_keys() {
        let store = store();
        let overlay = InstrumentOverlay::new(&store);

        for key in ["FOO_X", "GDP_"] {
            let err = overlay
                .apply(&InstrumentVector::from([(key.to_string(), 1.0)]))
                .unwrap_err();
            assert!(matches!(err, Ml2Error::UnknownInstrument { .. }), "{}", key);
        }
    }

    #[test]
    fn test_nan_is_out_of_range() {
        let store = store();
        let err = InstrumentOverlay::new(&store)
            .apply(&InstrumentVector::from([("VIG_X".to_string(), f64::NAN)]))
            .unwrap_err();
        assert!(matches!(err, Ml2Error::OutOfRange { .. }));
    }
}
