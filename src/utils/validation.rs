use crate::utils::error::{Ml2Error, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number".to_string(),
        });
    }
    Ok(())
}

/// Finite and strictly greater than `lower`.
pub fn validate_above(field_name: &str, value: f64, lower: f64) -> Result<()> {
    validate_finite(field_name, value)?;
    if value <= lower {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be greater than {}", lower),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(Ml2Error::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_iterations", 5, 1).is_ok());
        assert!(validate_positive_number("max_iterations", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("relaxation", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_range("relaxation", 1.5, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_above_rejects_nan_and_bound() {
        assert!(validate_above("tolerance", 1e-6, 0.0).is_ok());
        assert!(validate_above("tolerance", 0.0, 0.0).is_err());
        assert!(validate_above("tolerance", f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_path", "./out").is_ok());
        assert!(validate_path("output_path", "").is_err());
        assert!(validate_path("output_path", "a\0b").is_err());
    }
}
