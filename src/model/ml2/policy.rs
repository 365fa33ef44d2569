//! Recursive pre-block: instrument mappings and policy-driven trends.

use super::variables::Vars;
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    // Instrument changes shift the level once and the shift persists.
    b.equation(v.ng, Phase::Recursive, EquationType::Technical, &[v.ng_x], move |f| {
        f.lag(v.ng, 1) + f.d(v.ng_x)
    });

    let trend = s.tfp_growth;
    b.equation(v.ig, Phase::Recursive, EquationType::Technical, &[v.vig_x], move |f| {
        // mln -> bn
        f.lag(v.ig, 1) * (1.0 + trend) + f.d(v.vig_x) / 1000.0
    });

    let spread = s.mortgage_spread;
    b.equation(v.rmort, Phase::Recursive, EquationType::Technical, &[v.rnom], move |f| {
        f.get(v.rnom) + spread
    });

    b.equation(v.itpc0r, Phase::Recursive, EquationType::Technical, &[v.itpc0r_x], move |f| {
        f.get(v.itpc0r_x)
    });
    b.equation(v.cssfr, Phase::Recursive, EquationType::Technical, &[v.cssfr_x], move |f| {
        f.get(v.cssfr_x) / 100.0
    });
    b.equation(v.csshr, Phase::Recursive, EquationType::Technical, &[v.csshr_x], move |f| {
        f.get(v.csshr_x) / 100.0
    });

    b.equation(v.ds, Phase::Recursive, EquationType::Technical, &[], move |f| f.lag(v.ds, 1));
}
