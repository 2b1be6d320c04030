use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Remote service '{service}' returned {status}: {message}")]
    RemoteError {
        service: String,
        status: u16,
        message: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on '{field}': {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Unknown service '{key}'")]
    UnknownService { key: String },

    #[error("Unknown anode '{id}'")]
    UnknownAnode { id: String },

    #[error("Too many requests for '{key}', try again later")]
    RateLimited { key: String },
}

pub type Result<T> = std::result::Result<T, QuoteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Storage,
    Configuration,
    Input,
    Throttling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuoteError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        QuoteError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QuoteError::ApiError(_) => ErrorCategory::Network,
            QuoteError::RemoteError { .. } => ErrorCategory::Remote,
            QuoteError::CsvError(_)
            | QuoteError::IoError(_)
            | QuoteError::SerializationError(_) => ErrorCategory::Storage,
            QuoteError::ConfigValidationError { .. }
            | QuoteError::MissingConfigError { .. }
            | QuoteError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            QuoteError::ValidationError { .. }
            | QuoteError::UnknownService { .. }
            | QuoteError::UnknownAnode { .. } => ErrorCategory::Input,
            QuoteError::RateLimited { .. } => ErrorCategory::Throttling,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Throttling => ErrorSeverity::Medium,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Remote => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Exit code used by the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            QuoteError::ApiError(_) => "Check the network connection and the Supabase URL",
            QuoteError::RemoteError { status, .. } if *status == 401 || *status == 403 => {
                "Sign in again with a staff account that has admin access"
            }
            QuoteError::RemoteError { .. } => "Review the request details and retry",
            QuoteError::CsvError(_) => "Check the output path is writable",
            QuoteError::IoError(_) => "Make sure the file exists and is readable",
            QuoteError::SerializationError(_) => "Check the JSON file is well formed",
            QuoteError::ConfigValidationError { .. }
            | QuoteError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            QuoteError::MissingConfigError { .. } => {
                "Add the missing value to the config file or environment"
            }
            QuoteError::ValidationError { .. } => "Correct the highlighted field and try again",
            QuoteError::UnknownService { .. } => {
                "Use one of the listed service keys (dive-quote services)"
            }
            QuoteError::UnknownAnode { .. } => {
                "Look the anode up with `dive-quote anodes --search`"
            }
            QuoteError::RateLimited { .. } => "Wait 15 minutes before submitting again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuoteError::ApiError(_) => "Could not reach the booking service".to_string(),
            QuoteError::RemoteError { message, .. } => {
                format!("The booking service refused the request: {}", message)
            }
            QuoteError::ValidationError { field, reason } => format!("{}: {}", field, reason),
            QuoteError::UnknownService { key } => format!("'{}' is not a service we offer", key),
            QuoteError::UnknownAnode { id } => format!("Anode '{}' is not in the catalog", id),
            QuoteError::RateLimited { .. } => {
                "Too many requests. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_high_severity() {
        let err = QuoteError::validation("boat_length_ft", "required");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_auth_failures_suggest_sign_in() {
        let err = QuoteError::RemoteError {
            service: "charge-for-service".to_string(),
            status: 403,
            message: "Forbidden - Admin access required".to_string(),
        };
        assert!(err.recovery_suggestion().contains("admin"));
        assert!(err.user_friendly_message().contains("Forbidden"));
    }
}
