use crate::domain::model::Year;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Ml2Error {
    #[error("Unknown instrument: {key}")]
    UnknownInstrument { key: String },

    #[error("{key}: {value} out of range [{min}, {max}]")]
    OutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Variable not found: {key}")]
    NotFound { key: String },

    #[error("Missing parameter {key} for year {year}")]
    MissingParameter { key: String, year: Year },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Report formatting error: {message}")]
    ReportError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Solver task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 請求內容不合法（未知工具、超出範圍）
    Validation,
    /// 模型或設定檔錯誤，啟動時即失敗
    Configuration,
    Export,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl Ml2Error {
    pub fn config(message: impl Into<String>) -> Self {
        Ml2Error::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Ml2Error::UnknownInstrument { .. } | Ml2Error::OutOfRange { .. } => {
                ErrorCategory::Validation
            }
            Ml2Error::NotFound { .. }
            | Ml2Error::MissingParameter { .. }
            | Ml2Error::ConfigError { .. }
            | Ml2Error::InvalidConfigValue { .. }
            | Ml2Error::MissingConfig { .. } => ErrorCategory::Configuration,
            Ml2Error::ReportError { .. }
            | Ml2Error::CsvError(_)
            | Ml2Error::ZipError(_)
            | Ml2Error::IoError(_)
            | Ml2Error::SerializationError(_) => ErrorCategory::Export,
            Ml2Error::TaskError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Export => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Ml2Error::UnknownInstrument { key } => {
                format!("'{}' is not a policy instrument of this model", key)
            }
            Ml2Error::OutOfRange {
                key,
                value,
                min,
                max,
            } => format!(
                "Instrument {} = {} is outside the allowed range [{}, {}]",
                key, value, min, max
            ),
            Ml2Error::MissingParameter { key, year } => {
                format!("No calibration value for {} in {}", key, year)
            }
            Ml2Error::InvalidConfigValue { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Ml2Error::MissingConfig { field } => format!("Missing setting '{}'", field),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => {
                "Check the instrument keys and ranges listed by the baseline output"
            }
            ErrorCategory::Configuration => {
                "Fix the model calibration or configuration file and restart"
            }
            ErrorCategory::Export => "Check the output path permissions and free disk space",
            ErrorCategory::Internal => "Re-run with --verbose and report the log",
        }
    }
}

pub type Result<T> = std::result::Result<T, Ml2Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_medium_severity() {
        let err = Ml2Error::OutOfRange {
            key: "VIG_X".to_string(),
            value: 9000.0,
            min: -2000.0,
            max: 6000.0,
        };
        assert!(err.is_validation());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.to_string(), "VIG_X: 9000 out of range [-2000, 6000]");
    }

    #[test]
    fn test_configuration_errors_are_critical() {
        let err = Ml2Error::config("duplicate variable K_");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
