//! Behavioural demand: consumption, investment and trade volumes.

use super::variables::Vars;
use super::{dln_ratio, grow, seed_gap};
use crate::domain::model::Phase;
use crate::model::frame::log_change;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let clamp = s.growth_clamp;

    let (c0, c1, c2, c3, c4, c5, c6) = (s.c0, s.c1, s.c2, s.c3, s.c4, s.c5, s.c6);
    b.equation(
        v.c,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.ydh, v.pc, v.ur, v.rreal],
        move |f| {
            let ecm = seed_gap(f, &[(v.c, 1.0), (v.ydh, -c5), (v.pc, c5)]);
            let habit = log_change(f.lag(v.c, 1), f.lag(v.c, 2));
            let dln_c = c0
                + c1 * dln_ratio(f, v.ydh, v.pc)
                + c2 * f.d(v.rreal)
                + c3 * f.d(v.ur)
                + c4 * ecm
                + c6 * habit;
            grow(f, v.c, dln_c, clamp)
        },
    );

    let (if0, if1, if2, if3, if4, if5, if6) = (s.if0, s.if1, s.if2, s.if3, s.if4, s.if5, s.if6);
    b.equation(
        v.inv_f,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.y, v.profit, v.rreal, v.zkf],
        move |f| {
            let ecm = seed_gap(f, &[(v.inv_f, 1.0), (v.y, -if6)]);
            let dln_if = if0
                + if1 * f.dln(v.y)
                + if2 * f.d(v.profit)
                + if3 * f.d(v.rreal)
                + if4 * f.d(v.zkf)
                + if5 * ecm;
            grow(f, v.inv_f, dln_if, clamp)
        },
    );

    let (ih0, ih1, ih2, ih3, ih4) = (s.ih0, s.ih1, s.ih2, s.ih3, s.ih4);
    b.equation(
        v.ih,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.ydh, v.pc, v.rmort],
        move |f| {
            let ecm = seed_gap(f, &[(v.ih, 1.0), (v.ydh, -ih4), (v.pc, ih4)]);
            let dln_ih =
                ih0 + ih1 * dln_ratio(f, v.ydh, v.pc) + ih2 * f.d(v.rmort) + ih3 * ecm;
            grow(f, v.ih, dln_ih, clamp)
        },
    );

    let (x0, x1, x2, x3, x4, x5) = (s.x0, s.x1, s.x2, s.x3, s.x4, s.x5);
    b.equation(
        v.x,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.xworld, v.px, v.pcomp],
        move |f| {
            let ecm = seed_gap(f, &[(v.x, 1.0), (v.xworld, -x4), (v.px, -x5), (v.pcomp, x5)]);
            let dln_x =
                x0 + x1 * f.dln(v.xworld) + x2 * dln_ratio(f, v.px, v.pcomp) + x3 * ecm;
            grow(f, v.x, dln_x, clamp)
        },
    );

    let (m0, m1, m2, m3, m4, m5) = (s.m0, s.m1, s.m2, s.m3, s.m4, s.m5);
    b.equation(
        v.m,
        Phase::Simultaneous,
        EquationType::Behavioral,
        &[v.dd, v.pm, v.pc],
        move |f| {
            let ecm = seed_gap(f, &[(v.m, 1.0), (v.dd, -m4), (v.pm, -m5), (v.pc, m5)]);
            let dln_m = m0 + m1 * f.dln(v.dd) + m2 * dln_ratio(f, v.pm, v.pc) + m3 * ecm;
            grow(f, v.m, dln_m, clamp)
        },
    );
}
