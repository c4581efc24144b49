use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

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

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Could not parse {source_name} response: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LeadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LeadError::HttpError(_) | LeadError::HttpStatusError { .. } => ErrorCategory::Network,
            LeadError::ConfigError { .. }
            | LeadError::ConfigValidationError { .. }
            | LeadError::InvalidConfigValueError { .. }
            | LeadError::MissingConfigError { .. } => ErrorCategory::Configuration,
            LeadError::ZipError(_) | LeadError::IoError(_) => ErrorCategory::Storage,
            LeadError::CsvError(_)
            | LeadError::SerializationError(_)
            | LeadError::ParseError { .. }
            | LeadError::ProcessingError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一來源抓取失敗只影響該來源
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => match self {
                LeadError::ParseError { .. } => ErrorSeverity::Low,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LeadError::HttpError(_) => "Check network connectivity and the configured endpoints",
            LeadError::HttpStatusError { status, .. } if *status == 429 => {
                "The source is rate limiting; lower http.concurrent_requests and retry later"
            }
            LeadError::HttpStatusError { .. } => {
                "The source rejected the request; verify the URL or credentials"
            }
            LeadError::ConfigError { .. }
            | LeadError::ConfigValidationError { .. }
            | LeadError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again"
            }
            LeadError::MissingConfigError { .. } => "Add the missing key to the configuration file",
            LeadError::IoError(_) | LeadError::ZipError(_) => {
                "Check that output.path exists and is writable"
            }
            LeadError::ParseError { .. } => "The page layout probably changed; the source is skipped",
            LeadError::CsvError(_)
            | LeadError::SerializationError(_)
            | LeadError::ProcessingError { .. } => "Re-run with --verbose to inspect the offending record",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Storage => format!("Could not write results: {}", self),
        }
    }

    pub(crate) fn parse(source_name: &str, message: impl Into<String>) -> Self {
        LeadError::ParseError {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LeadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = LeadError::MissingConfigError {
            field: "supabase.key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_rate_limit_suggestion() {
        let err = LeadError::HttpStatusError {
            url: "https://www.instagram.com/x/".to_string(),
            status: 429,
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("rate limiting"));
    }

    #[test]
    fn test_parse_error_is_low() {
        let err = LeadError::parse("google", "no rating");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Could not parse google response: no rating");
    }
}
