use thiserror::Error;

#[derive(Error, Debug)]
pub enum PvGenError {
    #[error(
        "Shape mismatch: temperature is {}x{}, irradiance is {}x{}",
        .temperature.0,
        .temperature.1,
        .irradiance.0,
        .irradiance.1
    )]
    ShapeMismatch {
        temperature: (usize, usize),
        irradiance: (usize, usize),
    },

    #[error("Column label mismatch: temperature {temperature:?}, irradiance {irradiance:?}")]
    ColumnLabelMismatch {
        temperature: Vec<String>,
        irradiance: Vec<String>,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Io,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PvGenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PvGenError::ShapeMismatch { .. } | PvGenError::ColumnLabelMismatch { .. } => {
                ErrorCategory::Input
            }
            PvGenError::ConfigError { .. }
            | PvGenError::ConfigValidationError { .. }
            | PvGenError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PvGenError::IoError(_) => ErrorCategory::Io,
            PvGenError::CsvError(_)
            | PvGenError::SerializationError(_)
            | PvGenError::ProcessingError { .. }
            | PvGenError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Data => match self {
                // a malformed file can usually be fixed and the run repeated
                PvGenError::CsvError(_) | PvGenError::ProcessingError { .. } => {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::High,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PvGenError::ShapeMismatch { .. } => {
                "Make sure temperature and irradiance cover the same timestamps and locations"
                    .to_string()
            }
            PvGenError::ColumnLabelMismatch { .. } => {
                "Order the location columns identically in both tables".to_string()
            }
            PvGenError::CsvError(_) | PvGenError::ProcessingError { .. } => {
                "Check the delimiter, the missing-value token and the numeric cells of the input files"
                    .to_string()
            }
            PvGenError::IoError(_) => {
                "Check that the input directory exists and the output path is writable".to_string()
            }
            PvGenError::SerializationError(_) => {
                "Disable the run summary or report the failing values".to_string()
            }
            PvGenError::ConfigError { .. } | PvGenError::ConfigValidationError { .. } => {
                "Review the configuration file against the documented sections".to_string()
            }
            PvGenError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            PvGenError::ValidationError { .. } => "Inspect the input data".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input tables are not aligned: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Data => format!("Could not process the data: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PvGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_is_input_error() {
        let err = PvGenError::ShapeMismatch {
            temperature: (2, 3),
            irradiance: (2, 2),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Shape mismatch: temperature is 2x3, irradiance is 2x2"
        );
    }

    #[test]
    fn test_processing_error_is_retryable() {
        let err = PvGenError::ProcessingError {
            message: "bad cell".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
        assert!(err.user_friendly_message().contains("bad cell"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = PvGenError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.category(), ErrorCategory::Io);
        assert_eq!(err.exit_code(), 3);
    }
}
