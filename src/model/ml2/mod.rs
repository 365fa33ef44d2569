//! The ML2 macroeconomic model of the Belgian economy: variable table,
//! equation blocks and the embedded calibration.

mod accounts;
mod demand;
mod income;
mod labour;
mod policy;
mod prices;
mod production;
mod public_finance;
mod variables;

use crate::domain::model::Slot;
use crate::model::frame::Frame;
use crate::model::registry::{IndicatorSlots, ModelRegistry, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;
use crate::utils::error::Result;
use variables::Vars;

/// Seed year 2012, simulated horizon 2013-2020.
pub const EMBEDDED_CALIBRATION: &str = include_str!("../../../data/ml2_calibration.toml");

pub fn build_registry(scalars: &Ml2Scalars) -> Result<ModelRegistry> {
    let mut b = RegistryBuilder::new();
    variables::declare(&mut b);
    let v = Vars::resolve(&b)?;

    policy::register(&mut b, v, scalars);
    production::register(&mut b, v, scalars);
    labour::register(&mut b, v, scalars);
    prices::register(&mut b, v, scalars);
    income::register(&mut b, v, scalars);
    demand::register(&mut b, v, scalars);
    accounts::register(&mut b, v, scalars);
    public_finance::register(&mut b, v, scalars);

    b.indicators(IndicatorSlots {
        output: v.gdp,
        prices: v.pc,
        deficit_ratio: v.dr,
        unemployment_rate: v.ur,
    });
    b.build()
}

fn clamped_exp(x: f64, limit: f64) -> f64 {
    x.clamp(-limit, limit).exp()
}

/// Previous-year level grown by `dln` log points (clamped); non-positive levels stay put.
fn grow(f: &Frame<'_>, slot: Slot, dln: f64, limit: f64) -> f64 {
    let prev = f.lag(slot, 1);
    if prev <= 0.0 {
        return prev;
    }
    prev * clamped_exp(dln, limit)
}

/// Error-correction term `Σ coef·ln(x)` taken one year back and measured
/// against the same combination in the seed year.
fn seed_gap(f: &Frame<'_>, terms: &[(Slot, f64)]) -> f64 {
    let mut gap = 0.0;
    for &(slot, coef) in terms {
        let prev = f.lag(slot, 1);
        let seed = f.base(slot);
        if prev <= 0.0 || seed <= 0.0 {
            return 0.0;
        }
        gap += coef * (prev.ln() - seed.ln());
    }
    gap
}

/// `dln(a / b)` between the previous and current year.
fn dln_ratio(f: &Frame<'_>, a: Slot, b: Slot) -> f64 {
    let (a0, b0, a1, b1) = (f.get(a), f.get(b), f.lag(a, 1), f.lag(b, 1));
    if a0 > 0.0 && b0 > 0.0 && a1 > 0.0 && b1 > 0.0 {
        (a0 / b0).ln() - (a1 / b1).ln()
    } else {
        0.0
    }
}
