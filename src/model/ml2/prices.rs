//! Cost and price block.

use super::variables::Vars;
use super::{grow, seed_gap};
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let clamp = s.growth_clamp;

    b.equation(v.ulc, Phase::Simultaneous, EquationType::Identity, &[v.w, v.l, v.y], move |f| {
        let y = f.get(v.y);
        if y == 0.0 {
            return f.lag(v.ulc, 1);
        }
        f.get(v.w) * f.get(v.l) / y
    });

    let (cost_w, cost_pm) = (s.cost_w, s.cost_pm);
    b.equation(v.cost, Phase::Simultaneous, EquationType::Identity, &[v.ulc, v.pm], move |f| {
        cost_w * f.get(v.ulc) + cost_pm * f.get(v.pm)
    });

    let (pc0, pc1, pc2, pc3, pc4, pc5, pc_vat) =
        (s.pc0, s.pc1, s.pc2, s.pc3, s.pc4, s.pc5, s.pc_vat);
    b.equation(
        v.pc,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.cost, v.pm, v.ygap, v.itpc0r],
        move |f| {
            let ecm = seed_gap(f, &[(v.pc, 1.0), (v.cost, -pc5)]);
            // VAT rate is a percentage level
            let d_vat = f.d(v.itpc0r) / 100.0;
            let dln_pc = pc0
                + pc1 * f.dln(v.cost)
                + pc2 * f.dln(v.pm)
                + pc3 * f.get(v.ygap)
                + pc4 * ecm
                + pc_vat * d_vat;
            grow(f, v.pc, dln_pc, clamp)
        },
    );

    let (pif1, pif2, pif3) = (s.pif1, s.pif2, s.pif3);
    b.equation(v.pif, Phase::Simultaneous, EquationType::Behavioral, &[v.cost, v.pm], move |f| {
        let ecm = seed_gap(f, &[(v.pif, 1.0), (v.cost, -1.0)]);
        grow(f, v.pif, pif1 * f.dln(v.cost) + pif2 * f.dln(v.pm) + pif3 * ecm, clamp)
    });

    let (pih1, pih2, pih3) = (s.pih1, s.pih2, s.pih3);
    b.equation(v.pih, Phase::Simultaneous, EquationType::Behavioral, &[v.cost, v.pm], move |f| {
        let ecm = seed_gap(f, &[(v.pih, 1.0), (v.cost, -1.0)]);
        grow(f, v.pih, pih1 * f.dln(v.cost) + pih2 * f.dln(v.pm) + pih3 * ecm, clamp)
    });

    let (pig1, pig2) = (s.pig1, s.pig2);
    b.equation(v.pig, Phase::Simultaneous, EquationType::Technical, &[v.cost, v.pm], move |f| {
        grow(f, v.pig, pig1 * f.dln(v.cost) + pig2 * f.dln(v.pm), clamp)
    });

    let (px1, px2, px3) = (s.px1, s.px2, s.px3);
    b.equation(v.px, Phase::Simultaneous, EquationType::Behavioral, &[v.cost, v.pcomp], move |f| {
        let ecm = seed_gap(f, &[(v.px, 1.0), (v.pcomp, -1.0)]);
        grow(f, v.px, px1 * f.dln(v.cost) + px2 * f.dln(v.pcomp) + px3 * ecm, clamp)
    });

    b.equation(v.rreal, Phase::Simultaneous, EquationType::Identity, &[v.rnom, v.pc], move |f| {
        let pc_prev = f.lag(v.pc, 1);
        let inflation = if pc_prev > 0.0 {
            (f.get(v.pc) - pc_prev) / pc_prev
        } else {
            0.0
        };
        f.get(v.rnom) - inflation
    });
}
