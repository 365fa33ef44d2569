//! Profits, public consumption, transfers and household disposable income.

use super::clamped_exp;
use super::variables::Vars;
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let clamp = s.growth_clamp;

    b.equation(
        v.profit,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.y, v.w, v.l, v.pc, v.k],
        move |f| {
            let denominator = f.get(v.pc) * f.get(v.k);
            if denominator == 0.0 {
                return f.lag(v.profit, 1);
            }
            (f.get(v.y) - f.get(v.w) * f.get(v.l) / 1000.0) / denominator
        },
    );

    // Public wage bill plus a non-wage part growing with trend productivity.
    let trend = s.tfp_growth;
    b.equation(v.cg, Phase::Simultaneous, EquationType::Identity, &[v.wg, v.ng], move |f| {
        let wage_bill = f.get(v.wg) * f.get(v.ng) / 1000.0;
        let wage_bill_prev = f.lag(v.wg, 1) * f.lag(v.ng, 1) / 1000.0;
        let non_wage = f.lag(v.cg, 1) - wage_bill_prev;
        wage_bill + non_wage * (1.0 + trend)
    });

    b.equation(v.tgh, Phase::Simultaneous, EquationType::Technical, &[v.pc, v.tgh_x], move |f| {
        f.lag(v.tgh, 1) * clamped_exp(f.dln(v.pc), clamp) * (1.0 + f.get(v.tgh_x) / 100.0)
    });

    let tax_rate = s.income_tax_rate;
    b.equation(
        v.ydh,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.w, v.l, v.wg, v.ng, v.csshr, v.dth_x, v.tgh],
        move |f| {
            let wages = (f.get(v.w) * f.get(v.l) + f.get(v.wg) * f.get(v.ng)) / 1000.0;
            let net_wages = wages * (1.0 - f.get(v.csshr));
            let tax = net_wages * tax_rate + f.get(v.dth_x) / 1000.0;
            net_wages - tax + f.get(v.tgh)
        },
    );
}
