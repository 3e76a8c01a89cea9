use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed data at line {line}: {message}")]
    DataFormatError { line: u64, message: String },

    #[error("GeoJSON error: {message}")]
    GeoJsonError { message: String },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown harbour: {id}")]
    UnknownHarbour { id: String },

    #[error("No berth available in harbour '{harbour}' for ship '{ship}' ({length} m)")]
    NoBerthAvailable {
        harbour: String,
        ship: String,
        length: f64,
    },

    #[error("Ship '{ship}' is already docked")]
    ShipAlreadyDocked { ship: String },

    #[error("Ship '{ship}' is not docked in harbour '{harbour}'")]
    ShipNotDocked { harbour: String, ship: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Detection,
    Harbour,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼，失敗一律非零
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl AlertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AlertError::ConfigValidationError { .. }
            | AlertError::InvalidConfigValueError { .. }
            | AlertError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AlertError::CsvError(_)
            | AlertError::DataFormatError { .. }
            | AlertError::GeoJsonError { .. }
            | AlertError::SerializationError(_) => ErrorCategory::Data,
            AlertError::InvalidParameter { .. } => ErrorCategory::Detection,
            AlertError::UnknownHarbour { .. }
            | AlertError::NoBerthAvailable { .. }
            | AlertError::ShipAlreadyDocked { .. }
            | AlertError::ShipNotDocked { .. } => ErrorCategory::Harbour,
            AlertError::IoError(_) | AlertError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Harbour => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Detection => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AlertError::ConfigValidationError { .. }
            | AlertError::InvalidConfigValueError { .. }
            | AlertError::MissingConfigError { .. } => {
                "Check the settings file and the values passed on the command line"
            }
            AlertError::CsvError(_) | AlertError::DataFormatError { .. } => {
                "Make sure the csv has id, date, ship_type, lon and lat columns"
            }
            AlertError::GeoJsonError { .. } | AlertError::SerializationError(_) => {
                "Make sure the harbours file is a GeoJSON FeatureCollection of polygons"
            }
            AlertError::InvalidParameter { .. } => "Adjust the [detection] section of the settings",
            AlertError::UnknownHarbour { .. } => "Register the harbour before using it",
            AlertError::NoBerthAvailable { .. } => "Free a berth or add a longer one",
            AlertError::ShipAlreadyDocked { .. } | AlertError::ShipNotDocked { .. } => {
                "Check the movements log for the ship"
            }
            AlertError::IoError(_) | AlertError::ZipError(_) => {
                "Check that the data and alerts folders exist and are writable"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid settings: {}", self),
            ErrorCategory::Data => format!("Could not read input data: {}", self),
            ErrorCategory::Detection => format!("Detector rejected its parameters: {}", self),
            ErrorCategory::Harbour => format!("Harbour operation refused: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_display() {
        let err = AlertError::DataFormatError {
            line: 4,
            message: "bad date".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed data at line 4: bad date");
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_severity_by_category() {
        let io = AlertError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);

        let harbour = AlertError::UnknownHarbour {
            id: "h1".to_string(),
        };
        assert_eq!(harbour.severity(), ErrorSeverity::Medium);

        let param = AlertError::InvalidParameter {
            name: "threshold".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(param.severity(), ErrorSeverity::High);
        assert!(param.user_friendly_message().contains("threshold"));
    }

    #[test]
    fn test_failures_never_exit_zero() {
        let config = AlertError::MissingConfigError {
            field: "data.root".to_string(),
        };
        let zip = AlertError::ZipError(zip::result::ZipError::FileNotFound);
        let berth = AlertError::ShipNotDocked {
            harbour: "h1".to_string(),
            ship: "s1".to_string(),
        };

        assert_eq!(config.severity().exit_code(), 1);
        assert_eq!(berth.severity().exit_code(), 2);
        assert_eq!(zip.severity().exit_code(), 3);
    }
}
