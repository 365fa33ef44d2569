#![allow(dead_code)]

use ml2_engine::core::{Calibration, ParameterStore};
use ml2_engine::domain::model::{ImpactKind, Phase, SolverSettings};
use ml2_engine::model::{
    EquationType, IndicatorSlots, InstrumentSpec, ModelRegistry, RegistryBuilder, VariableDecl,
};
use ml2_engine::SimulationEngine;
use std::sync::Arc;

/// Year in which `SHOCK_X > 0` makes the output equation blow up.
pub const SHOCK_YEAR: i32 = 2015;

pub const CALIBRATION: &str = r#"
seed_year = 2012
end_year = 2017

[seed]
G0_ = 100.0
P_ = 1.0
C_ = 140.0
GDP_ = 240.0
INV_ = 0.5
BAL_ = -52.0
DR_ = 0.2167
UR_ = 0.08

[parameters.G0_]
growth = 0.02
"#;

fn instrument(key: &str, default: f64, min: f64, max: f64) -> InstrumentSpec {
    InstrumentSpec {
        key: key.to_string(),
        label: key.to_string(),
        unit: "mln EUR".to_string(),
        default,
        min,
        max,
        description: String::new(),
    }
}

/// Small demand-driven economy: GDP = C + G + VIG_X / 10, C = 0.5 GDP + 20.
/// Its investment multiplier is positive.
pub fn synthetic_registry() -> ModelRegistry {
    let mut b = RegistryBuilder::new();
    let vig = b.instrument(instrument("VIG_X", 0.0, -5000.0, 5000.0));
    let shock = b.instrument(instrument("SHOCK_X", 0.0, 0.0, 1.0));
    let g0 = b.parameter(VariableDecl::new("G0_", "mln EUR", ImpactKind::Relative { floor: 1.0 }));

    let p = b.endogenous(VariableDecl::new("P_", "index", ImpactKind::Relative { floor: 0.01 }));
    let c = b.endogenous(VariableDecl::new("C_", "mln EUR", ImpactKind::Relative { floor: 1.0 }));
    let gdp = b.endogenous(
        VariableDecl::new("GDP_", "mln EUR", ImpactKind::Relative { floor: 1.0 })
            .describe("Real output"),
    );
    let inv = b.endogenous(VariableDecl::new("INV_", "ratio", ImpactKind::Relative { floor: 0.5 }));
    let bal = b.endogenous(VariableDecl::new("BAL_", "mln EUR", ImpactKind::Absolute));
    let dr = b.endogenous(VariableDecl::new("DR_", "fraction", ImpactKind::PercentagePoint));
    let ur = b.endogenous(VariableDecl::new("UR_", "fraction", ImpactKind::PercentagePoint));

    b.equation(p, Phase::Recursive, EquationType::Technical, &[p], move |f| {
        f.lag(p, 1) * 1.02
    });
    b.equation(c, Phase::Simultaneous, EquationType::Behavioral, &[gdp], move |f| {
        0.5 * f.get(gdp) + 20.0
    });
    b.equation(gdp, Phase::Simultaneous, EquationType::Identity, &[c, g0, vig, shock], move |f| {
        if f.year() == SHOCK_YEAR && f.get(shock) > 0.0 {
            return f64::NAN;
        }
        f.get(c) + f.get(g0) + f.get(vig) / 10.0
    });
    b.equation(inv, Phase::Derived, EquationType::Identity, &[vig], move |f| {
        0.5 + f.get(vig) / 1000.0
    });
    b.equation(bal, Phase::Derived, EquationType::Identity, &[gdp, g0, vig], move |f| {
        0.2 * f.get(gdp) - f.get(g0) - f.get(vig) / 10.0
    });
    b.equation(dr, Phase::Derived, EquationType::Identity, &[bal, gdp], move |f| {
        -f.get(bal) / f.get(gdp)
    });
    b.equation(ur, Phase::Derived, EquationType::Behavioral, &[gdp], move |f| {
        0.08 - 0.0001 * (f.get(gdp) - f.base(gdp))
    });
    b.indicators(IndicatorSlots {
        output: gdp,
        prices: p,
        deficit_ratio: dr,
        unemployment_rate: ur,
    });

    b.build().expect("synthetic registry is well formed")
}

pub fn synthetic_store() -> ParameterStore {
    let calibration = Calibration::from_toml_str(CALIBRATION).expect("calibration parses");
    ParameterStore::load(Arc::new(synthetic_registry()), &calibration).expect("calibration loads")
}

pub fn synthetic_engine(settings: SolverSettings) -> SimulationEngine {
    SimulationEngine::new(synthetic_store(), settings)
}
