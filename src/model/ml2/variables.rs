use crate::domain::model::{ImpactKind, Slot};
use crate::model::registry::{InstrumentSpec, RegistryBuilder, VariableDecl};
use crate::utils::error::Result;

const LEVEL: ImpactKind = ImpactKind::Relative { floor: 1e-9 };
const RATE: ImpactKind = ImpactKind::PercentagePoint;
const ABS: ImpactKind = ImpactKind::Absolute;

/// (key, label, unit, default, min, max, description)
type InstrumentRow = (&'static str, &'static str, &'static str, f64, f64, f64, &'static str);

const INSTRUMENTS: &[InstrumentRow] = &[
    ("VIG_X", "Public Investments", "mln EUR (change)", 0.0, -2000.0, 6000.0,
        "Change in public investment expenditure (millions EUR, constant prices)"),
    ("ITPC0R_X", "VAT Rate", "% (level)", 21.0, 15.0, 27.0,
        "Standard VAT rate on consumption (%)"),
    ("DTH_X", "Income Tax Receipts", "mln EUR (change)", 0.0, -10000.0, 10000.0,
        "Change in personal income tax receipts (millions EUR)"),
    ("CSSFR_X", "Employer SSC Rate", "% of wages (level)", 30.0, 25.0, 40.0,
        "Employer social security contribution rate (% of gross wages)"),
    ("CSSHR_X", "Employee SSC Rate", "% of wages (level)", 13.0, 10.0, 20.0,
        "Employee social security contribution rate (% of gross wages)"),
    ("TGH_X", "Transfers to Households", "% (growth rate)", 0.0, -5.0, 5.0,
        "Additional growth rate of transfers to households (%, constant prices)"),
    ("WR_X", "Private Wage Correction", "pp", 0.0, -2.0, 2.0,
        "Correction to private sector nominal wage growth (percentage points)"),
    ("WGRR_X", "Public Real Wage Growth", "% p.a.", 0.0, -2.0, 5.0,
        "Real wage growth in the public sector (% per year)"),
    ("NG_X", "Public Employment", "thousands (change)", 0.0, -40.0, 40.0,
        "Change in public sector employment (thousands of persons)"),
    ("ZX_X", "Indexation Correction", "pp", 0.0, -2.0, 0.0,
        "Change in automatic wage indexation mechanism (percentage points)"),
];

type VariableRow = (&'static str, &'static str, ImpactKind, &'static str);

const PARAMETERS: &[VariableRow] = &[
    ("TFP_", "index", LEVEL, "Total factor productivity"),
    ("NAT_", "thousands", LEVEL, "Labour force"),
    ("XWORLD_", "index", LEVEL, "World demand"),
    ("PCOMP_", "index", LEVEL, "Foreign competitor prices"),
    ("PM_", "index", LEVEL, "Import prices"),
    ("RNOM_", "fraction", RATE, "Nominal interest rate"),
];

// Declaration order is evaluation order within each phase.
const ENDOGENOUS: &[VariableRow] = &[
    // recursive pre-block
    ("NG_", "thousands", LEVEL, "Public employment"),
    ("IG_", "bn EUR", LEVEL, "Public investment"),
    ("RMORT_", "fraction", RATE, "Mortgage rate"),
    ("ITPC0R_", "%", ABS, "Effective VAT rate"),
    ("CSSFR_", "fraction", RATE, "Employer SSC rate"),
    ("CSSHR_", "fraction", RATE, "Employee SSC rate"),
    ("DS_", "bn EUR", ABS, "Stock changes"),
    // simultaneous block
    ("K_", "bn EUR", LEVEL, "Capital stock"),
    ("Y_", "bn EUR", LEVEL, "Value added (Cobb-Douglas)"),
    ("YSTAR_", "bn EUR", LEVEL, "Potential output"),
    ("YGAP_", "fraction", RATE, "Output gap"),
    ("ZKF_", "ratio", RATE, "Capacity utilisation"),
    ("LH_", "mln hours", LEVEL, "Labour demand in hours"),
    ("L_", "thousands", LEVEL, "Private employment"),
    ("U_", "thousands", LEVEL, "Unemployment"),
    ("UR_", "fraction", RATE, "Unemployment rate"),
    ("W_", "1000 EUR", LEVEL, "Average private wage"),
    ("WG_", "1000 EUR", LEVEL, "Average public wage"),
    ("ULC_", "index", LEVEL, "Unit labour cost"),
    ("COST_", "index", LEVEL, "Macro cost index"),
    ("PC_", "index", LEVEL, "Consumer prices"),
    ("PIF_", "index", LEVEL, "Business investment deflator"),
    ("PIH_", "index", LEVEL, "Housing investment deflator"),
    ("PIG_", "index", LEVEL, "Public investment deflator"),
    ("PX_", "index", LEVEL, "Export prices"),
    ("RREAL_", "fraction", RATE, "Real interest rate"),
    ("PROFIT_", "fraction", RATE, "Profit rate"),
    ("CG_", "bn EUR", LEVEL, "Public consumption"),
    ("TGH_", "bn EUR", LEVEL, "Transfers to households"),
    ("YDH_", "bn EUR", LEVEL, "Household disposable income"),
    ("C_", "bn EUR", LEVEL, "Private consumption"),
    ("IF_", "bn EUR", LEVEL, "Business investment"),
    ("IH_", "bn EUR", LEVEL, "Housing investment"),
    ("DD_", "bn EUR", LEVEL, "Domestic demand"),
    ("X_", "bn EUR", LEVEL, "Exports"),
    ("M_", "bn EUR", LEVEL, "Imports"),
    ("GDP_", "bn EUR", LEVEL, "GDP at constant prices"),
    ("PGDP_", "index", LEVEL, "GDP deflator"),
    ("GDPN_", "bn EUR", LEVEL, "Nominal GDP"),
    ("GRECEIPTS_", "bn EUR", LEVEL, "Government receipts"),
    ("GEXPENSE_", "bn EUR", LEVEL, "Government expenditure"),
    ("D_", "bn EUR", ABS, "Government balance (negative = deficit)"),
    ("B_", "bn EUR", LEVEL, "Public debt"),
    // derived post-block
    ("I_", "bn EUR", LEVEL, "Total investment"),
    ("PROD_", "EUR per hour", LEVEL, "Labour productivity"),
    ("WB_", "bn EUR", LEVEL, "Total wage bill"),
    ("DR_", "fraction", RATE, "Balance to GDP ratio"),
    ("BR_", "fraction", RATE, "Debt to GDP ratio"),
    ("XN_", "bn EUR", LEVEL, "Nominal exports"),
    ("MN_", "bn EUR", LEVEL, "Nominal imports"),
    ("TB_", "bn EUR", ABS, "Trade balance"),
    ("TBR_", "fraction", RATE, "Trade balance to GDP ratio"),
];

pub(super) fn declare(b: &mut RegistryBuilder) {
    for &(key, label, unit, default, min, max, description) in INSTRUMENTS {
        b.instrument(InstrumentSpec {
            key: key.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            default,
            min,
            max,
            description: description.to_string(),
        });
    }
    for &(key, unit, impact, description) in PARAMETERS {
        b.parameter(VariableDecl::new(key, unit, impact).describe(description));
    }
    for &(key, unit, impact, description) in ENDOGENOUS {
        b.endogenous(VariableDecl::new(key, unit, impact).describe(description));
    }
}

macro_rules! vars {
    ($($field:ident => $key:literal),* $(,)?) => {
        /// Slots of every ML2 variable, resolved once while the registry is built.
        #[derive(Debug, Clone, Copy)]
        pub(super) struct Vars {
            $(pub $field: Slot,)*
        }

        impl Vars {
            pub(super) fn resolve(b: &RegistryBuilder) -> Result<Self> {
                Ok(Self {
                    $($field: b.resolve($key)?,)*
                })
            }
        }
    };
}

vars! {
    vig_x => "VIG_X",
    itpc0r_x => "ITPC0R_X",
    dth_x => "DTH_X",
    cssfr_x => "CSSFR_X",
    csshr_x => "CSSHR_X",
    tgh_x => "TGH_X",
    wr_x => "WR_X",
    wgrr_x => "WGRR_X",
    ng_x => "NG_X",
    zx_x => "ZX_X",

    tfp => "TFP_",
    nat => "NAT_",
    xworld => "XWORLD_",
    pcomp => "PCOMP_",
    pm => "PM_",
    rnom => "RNOM_",

    ng => "NG_",
    ig => "IG_",
    rmort => "RMORT_",
    itpc0r => "ITPC0R_",
    cssfr => "CSSFR_",
    csshr => "CSSHR_",
    ds => "DS_",

    k => "K_",
    y => "Y_",
    ystar => "YSTAR_",
    ygap => "YGAP_",
    zkf => "ZKF_",
    lh => "LH_",
    l => "L_",
    u => "U_",
    ur => "UR_",
    w => "W_",
    wg => "WG_",
    ulc => "ULC_",
    cost => "COST_",
    pc => "PC_",
    pif => "PIF_",
    pih => "PIH_",
    pig => "PIG_",
    px => "PX_",
    rreal => "RREAL_",
    profit => "PROFIT_",
    cg => "CG_",
    tgh => "TGH_",
    ydh => "YDH_",
    c => "C_",
    inv_f => "IF_",
    ih => "IH_",
    dd => "DD_",
    x => "X_",
    m => "M_",
    gdp => "GDP_",
    pgdp => "PGDP_",
    gdpn => "GDPN_",
    greceipts => "GRECEIPTS_",
    gexpense => "GEXPENSE_",
    d => "D_",
    b => "B_",

    i => "I_",
    prod => "PROD_",
    wb => "WB_",
    dr => "DR_",
    br => "BR_",
    xn => "XN_",
    mn => "MN_",
    tb => "TB_",
    tbr => "TBR_",
}

#[cfg(test)]
pub(super) fn instrument_count() -> usize {
    INSTRUMENTS.len()
}
