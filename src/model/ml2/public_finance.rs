//! Government receipts, expenditure, balance and debt.

use super::variables::Vars;
use crate::domain::model::Phase;
use crate::model::registry::{EquationType, RegistryBuilder};
use crate::model::scalars::Ml2Scalars;

pub(super) fn register(b: &mut RegistryBuilder, v: Vars, s: &Ml2Scalars) {
    let (tax_rate, other_revenue) = (s.income_tax_rate, s.other_revenue_share);
    b.equation(
        v.greceipts,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.w, v.l, v.wg, v.ng, v.c, v.pc, v.itpc0r, v.cssfr, v.csshr, v.dth_x, v.gdpn],
        move |f| {
            let wages = (f.get(v.w) * f.get(v.l) + f.get(v.wg) * f.get(v.ng)) / 1000.0;
            let csshr = f.get(v.csshr);
            let employer_ssc = wages * f.get(v.cssfr);
            let employee_ssc = wages * csshr;
            let income_tax = wages * (1.0 - csshr) * tax_rate + f.get(v.dth_x) / 1000.0;

            // VAT is included in consumer spending
            let vat = f.get(v.itpc0r) / 100.0;
            let vat_revenue = f.get(v.c) * f.get(v.pc) * vat / (1.0 + vat);

            income_tax + vat_revenue + employer_ssc + employee_ssc + f.get(v.gdpn) * other_revenue
        },
    );

    let (debt_rate, other_expense) = (s.debt_rate, s.other_expense_share);
    b.equation(
        v.gexpense,
        Phase::Simultaneous,
        EquationType::Identity,
        &[v.cg, v.pc, v.ig, v.pig, v.tgh, v.gdpn],
        move |f| {
            // interest accrues on the debt outstanding at the start of the year
            let interest = f.lag(v.b, 1) * debt_rate;
            f.get(v.cg) * f.get(v.pc)
                + f.get(v.ig) * f.get(v.pig)
                + f.get(v.tgh)
                + interest
                + f.get(v.gdpn) * other_expense
        },
    );

    b.equation(v.d, Phase::Simultaneous, EquationType::Identity, &[v.greceipts, v.gexpense], move |f| {
        f.get(v.greceipts) - f.get(v.gexpense)
    });

    b.equation(v.b, Phase::Simultaneous, EquationType::Identity, &[v.d], move |f| {
        f.lag(v.b, 1) - f.get(v.d)
    });

    b.equation(v.dr, Phase::Derived, EquationType::Identity, &[v.d, v.gdpn], move |f| {
        let gdpn = f.get(v.gdpn);
        if gdpn == 0.0 {
            return 0.0;
        }
        f.get(v.d) / gdpn
    });

    b.equation(v.br, Phase::Derived, EquationType::Identity, &[v.b, v.gdpn], move |f| {
        let gdpn = f.get(v.gdpn);
        if gdpn == 0.0 {
            return f.lag(v.br, 1);
        }
        f.get(v.b) / gdpn
    });
}
