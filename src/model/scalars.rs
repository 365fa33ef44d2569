use crate::utils::error::{Ml2Error, Result};
use crate::utils::validation::{validate_above, validate_finite, Validate};
use serde::{Deserialize, Serialize};

/// Estimated coefficients of the ML2 equations.
///
/// Every field can be overridden from the `[scalars]` table of the engine
/// configuration; unknown names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ml2Scalars {
    // production
    pub alpha: f64,
    pub delta: f64,
    pub tfp_growth: f64,

    // labour demand (hours)
    pub lh0: f64,
    pub lh1: f64,
    pub lh2: f64,

    // private consumption
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub c4: f64,
    pub c5: f64,
    pub c6: f64,

    // business investment
    pub if0: f64,
    pub if1: f64,
    pub if2: f64,
    pub if3: f64,
    pub if4: f64,
    pub if5: f64,
    pub if6: f64,

    // housing investment
    pub ih0: f64,
    pub ih1: f64,
    pub ih2: f64,
    pub ih3: f64,
    pub ih4: f64,

    // private wages
    pub w0: f64,
    pub w1: f64,
    pub w2: f64,
    pub w3: f64,
    pub w4: f64,

    // consumer prices
    pub pc0: f64,
    pub pc1: f64,
    pub pc2: f64,
    pub pc3: f64,
    pub pc4: f64,
    pub pc5: f64,
    pub pc_vat: f64,

    // deflators
    pub pif1: f64,
    pub pif2: f64,
    pub pif3: f64,
    pub pih1: f64,
    pub pih2: f64,
    pub pih3: f64,
    pub pig1: f64,
    pub pig2: f64,
    pub px1: f64,
    pub px2: f64,
    pub px3: f64,

    // macro cost index weights
    pub cost_w: f64,
    pub cost_pm: f64,

    // export volumes
    pub x0: f64,
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
    pub x4: f64,
    pub x5: f64,

    // import volumes
    pub m0: f64,
    pub m1: f64,
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
    pub m5: f64,

    // public finance
    pub income_tax_rate: f64,
    pub other_revenue_share: f64,
    pub other_expense_share: f64,
    pub debt_rate: f64,
    pub mortgage_spread: f64,

    /// Structural unemployment rate.
    pub nairu: f64,
    /// Bound (log points) on any single-year growth term.
    pub growth_clamp: f64,
}

impl Default for Ml2Scalars {
    fn default() -> Self {
        Self {
            alpha: 0.675,
            delta: 0.05,
            tfp_growth: 0.007,

            lh0: -0.002,
            lh1: 0.45,
            lh2: -0.12,

            c0: 0.003,
            c1: 0.55,
            c2: -0.15,
            c3: -0.08,
            c4: -0.10,
            c5: 0.85,
            c6: 0.30,

            if0: 0.002,
            if1: 0.35,
            if2: 0.15,
            if3: -0.10,
            if4: 0.20,
            if5: -0.08,
            if6: 0.90,

            ih0: 0.001,
            ih1: 0.40,
            ih2: -0.25,
            ih3: -0.06,
            ih4: 0.80,

            w0: 0.002,
            w1: 0.95,
            w2: 0.60,
            w3: -0.50,
            w4: -0.08,

            pc0: 0.001,
            pc1: 0.70,
            pc2: 0.20,
            pc3: 0.05,
            pc4: -0.10,
            pc5: 0.90,
            pc_vat: 0.38,

            pif1: 0.60,
            pif2: 0.30,
            pif3: -0.08,
            pih1: 0.50,
            pih2: 0.25,
            pih3: -0.06,
            pig1: 0.55,
            pig2: 0.25,
            px1: 0.40,
            px2: 0.55,
            px3: -0.12,

            cost_w: 0.65,
            cost_pm: 0.35,

            x0: 0.002,
            x1: 0.80,
            x2: -0.30,
            x3: -0.10,
            x4: 1.00,
            x5: -0.50,

            m0: 0.001,
            m1: 0.70,
            m2: 0.20,
            m3: -0.08,
            m4: 1.10,
            m5: 0.40,

            income_tax_rate: 0.25,
            other_revenue_share: 0.19,
            other_expense_share: 0.08,
            debt_rate: 0.03,
            mortgage_spread: 0.015,

            nairu: 0.08,
            growth_clamp: 0.5,
        }
    }
}

impl Ml2Scalars {
    /// Applies `[scalars]` overrides from a TOML table on top of the defaults.
    pub fn from_overrides(table: &toml::Table) -> Result<Self> {
        let scalars: Ml2Scalars = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e| Ml2Error::config(format!("Invalid [scalars] override: {}", e)))?;
        scalars.validate()?;
        Ok(scalars)
    }
}

impl Validate for Ml2Scalars {
    fn validate(&self) -> Result<()> {
        let value = toml::Value::try_from(self)
            .map_err(|e| Ml2Error::config(format!("Cannot inspect scalars: {}", e)))?;
        if let toml::Value::Table(table) = value {
            for (name, v) in &table {
                if let Some(x) = v.as_float() {
                    validate_finite(&format!("scalars.{}", name), x)?;
                }
            }
        }
        validate_above("scalars.alpha", self.alpha, 0.0)?;
        if self.alpha >= 1.0 {
            return Err(Ml2Error::InvalidConfigValue {
                field: "scalars.alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "Labour share must be below 1".to_string(),
            });
        }
        validate_above("scalars.growth_clamp", self.growth_clamp, 0.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Ml2Scalars::default().validate().is_ok());
    }

    #[test]
    fn test_override_single_coefficient() {
        let table: toml::Table = toml::from_str("c1 = 0.6\nnairu = 0.07").unwrap();
        let scalars = Ml2Scalars::from_overrides(&table).unwrap();
        assert_eq!(scalars.c1, 0.6);
        assert_eq!(scalars.nairu, 0.07);
        assert_eq!(scalars.alpha, Ml2Scalars::default().alpha);
    }

    #[test]
    fn test_unknown_coefficient_is_rejected() {
        let table: toml::Table = toml::from_str("c99 = 1.0").unwrap();
        let err = Ml2Scalars::from_overrides(&table).unwrap_err();
        assert!(err.to_string().contains("c99"));
    }

    #[test]
    fn test_alpha_must_be_a_share() {
        let table: toml::Table = toml::from_str("alpha = 1.2").unwrap();
        assert!(Ml2Scalars::from_overrides(&table).is_err());
    }
}
