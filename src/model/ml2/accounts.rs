//! National accounts identities, plus the derived post-block aggregates.

use super::variables::Vars;
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, _s: &Ml2Scalars) {
    b.equation(
        v.dd,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.c, v.inv_f, v.ih, v.ig, v.cg, v.ds],
        move |f| {
            f.get(v.c) + f.get(v.inv_f) + f.get(v.ih) + f.get(v.ig) + f.get(v.cg) + f.get(v.ds)
        },
    );

    b.equation(v.gdp, Phase::Simultaneous, EquationType::Identity, &[v.dd, v.x, v.m], move |f| {
        f.get(v.dd) + f.get(v.x) - f.get(v.m)
    });

    // Public consumption and stock changes are valued at consumer prices.
    b.equation(
        v.pgdp,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.gdp, v.c, v.pc, v.inv_f, v.pif, v.ih, v.pih, v.ig, v.pig, v.cg, v.x, v.px, v.m, v.pm, v.ds],
        move |f| {
            let gdp = f.get(v.gdp);
            if gdp == 0.0 {
                return f.lag(v.pgdp, 1);
            }
            let nominal = (f.get(v.c) + f.get(v.cg) + f.get(v.ds)) * f.get(v.pc)
                + f.get(v.inv_f) * f.get(v.pif)
                + f.get(v.ih) * f.get(v.pih)
                + f.get(v.ig) * f.get(v.pig)
                + f.get(v.x) * f.get(v.px)
                - f.get(v.m) * f.get(v.pm);
            nominal / gdp
        },
    );

    b.equation(v.gdpn, Phase::Simultaneous, EquationType::Identity, &[v.gdp, v.pgdp], move |f| {
        f.get(v.gdp) * f.get(v.pgdp)
    });

    b.equation(v.i, Phase::Derived, EquationType::Identity, &[v.inv_f, v.ih, v.ig], move |f| {
        f.get(v.inv_f) + f.get(v.ih) + f.get(v.ig)
    });

    b.equation(v.prod, Phase::Derived, EquationType::Identity, &[v.y, v.lh], move |f| {
        let lh = f.get(v.lh);
        if lh == 0.0 {
            return f.lag(v.prod, 1);
        }
        f.get(v.y) / lh
    });

    b.equation(v.wb, Phase::Derived, EquationType::Identity, &[v.w, v.l, v.wg, v.ng], move |f| {
        (f.get(v.w) * f.get(v.l) + f.get(v.wg) * f.get(v.ng)) / 1000.0
    });

    b.equation(v.xn, Phase::Derived, EquationType::Identity, &[v.x, v.px], move |f| {
        f.get(v.x) * f.get(v.px)
    });
    b.equation(v.mn, Phase::Derived, EquationType::Identity, &[v.m, v.pm], move |f| {
        f.get(v.m) * f.get(v.pm)
    });
    b.equation(v.tb, Phase::Derived, EquationType::Identity, &[v.xn, v.mn], move |f| {
        f.get(v.xn) - f.get(v.mn)
    });
    b.equation(v.tbr, Phase::Derived, EquationType::Identity, &[v.tb, v.gdpn], move |f| {
        let gdpn = f.get(v.gdpn);
        if gdpn == 0.0 {
            return 0.0;
        }
        f.get(v.tb) / gdpn
    });
}
