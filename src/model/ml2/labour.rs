//! Labour market: hours, employment, unemployment and wages.

use super::variables::Vars;
use super::{dln_ratio, grow, seed_gap};
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let clamp = s.growth_clamp;

    let (lh0, lh1, lh2, alpha) = (s.lh0, s.lh1, s.lh2, s.alpha);
    b.equation(v.lh, Phase::Simultaneous, EquationType::Behavioral, &[v.y, v.k, v.tfp], move |f| {
        let ecm = seed_gap(
            f,
            &[(v.y, 1.0), (v.k, -(1.0 - alpha)), (v.tfp, -1.0), (v.lh, -alpha)],
        );
        grow(f, v.lh, lh0 + lh1 * f.dln(v.y) + lh2 * ecm, clamp)
    });

    // Hours per worker stay constant.
    b.equation(v.l, Phase::Simultaneous, EquationType::Identity, &[v.lh], move |f| {
        let (lh_prev, l_prev) = (f.lag(v.lh, 1), f.lag(v.l, 1));
        if lh_prev == 0.0 || l_prev == 0.0 {
            return l_prev;
        }
        l_prev * f.get(v.lh) / lh_prev
    });

    b.equation(v.u, Phase::Simultaneous, EquationType::Identity, &[v.nat, v.l, v.ng], move |f| {
        f.get(v.nat) - f.get(v.l) - f.get(v.ng)
    });

    b.equation(v.ur, Phase::Simultaneous, EquationType::Identity, &[v.u, v.nat], move |f| {
        let nat = f.get(v.nat);
        if nat == 0.0 {
            return 0.0;
        }
        f.get(v.u) / nat
    });

    let (w0, w1, w2, w3, w4, nairu) = (s.w0, s.w1, s.w2, s.w3, s.w4, s.nairu);
    b.equation(
        v.w,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.pc, v.y, v.lh, v.l, v.ur, v.wr_x, v.zx_x],
        move |f| {
            // wage share W·L / (PC·Y), one year back against the seed year
            let share_gap = seed_gap(f, &[(v.w, 1.0), (v.l, 1.0), (v.pc, -1.0), (v.y, -1.0)]);
            let dln_w = w0
                + w1 * f.dln(v.pc)
                + w2 * dln_ratio(f, v.y, v.lh)
                + w3 * (f.get(v.ur) - nairu)
                + w4 * share_gap
                + f.get(v.wr_x) / 100.0
                + f.get(v.zx_x) / 100.0;
            grow(f, v.w, dln_w, clamp)
        },
    );

    b.equation(v.wg, Phase::Simultaneous, EquationType::Technical, &[v.pc, v.wgrr_x], move |f| {
        grow(f, v.wg, f.dln(v.pc) + f.get(v.wgrr_x) / 100.0, clamp)
    });
}
