use super::variables::Vars;
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let delta = s.delta;
    b.equation(v.k, Phase::Simultaneous, EquationType::Identity, &[v.inv_f], move |f| {
        f.get(v.inv_f) + (1.0 - delta) * f.lag(v.k, 1)
    });

    let alpha = s.alpha;
    b.equation(v.y, Phase::Simultaneous, EquationType::Behavioral, &[v.tfp, v.k, v.lh], move |f| {
        let (tfp, k, lh) = (f.get(v.tfp), f.get(v.k), f.get(v.lh));
        if tfp <= 0.0 || k <= 0.0 || lh <= 0.0 {
            return f.lag(v.y, 1);
        }
        tfp * k.powf(1.0 - alpha) * lh.powf(alpha)
    });

    // Structural employment at the NAIRU, converted to hours at the current hours-per-worker.
    let nairu = s.nairu;
    b.equation(
        v.ystar,
        Phase::Simultaneous,
        EquationType::Technical,
        &[v.tfp, v.k, v.nat, v.ng, v.lh, v.l],
        move |f| {
            let l_star = (1.0 - nairu) * f.get(v.nat) - f.get(v.ng);
            let lh_star = l_star * f.get(v.lh) / f.get(v.l).max(1.0);
            let k = f.get(v.k);
            if k <= 0.0 || lh_star <= 0.0 {
                return f.lag(v.ystar, 1);
            }
            f.get(v.tfp) * k.powf(1.0 - alpha) * lh_star.powf(alpha)
        },
    );

    b.equation(v.ygap, Phase::Simultaneous, EquationType::Identity, &[v.y, v.ystar], move |f| {
        let ystar = f.get(v.ystar);
        if ystar == 0.0 {
            return 0.0;
        }
        (f.get(v.y) - ystar) / ystar
    });

    b.equation(v.zkf, Phase::Simultaneous, EquationType::Identity, &[v.y, v.ystar], move |f| {
        let ystar = f.get(v.ystar);
        if ystar == 0.0 {
            return 1.0;
        }
        (f.get(v.y) / ystar).clamp(0.8, 1.1)
    });
}
