use thiserror::Error;

use crate::core::conflict::Rejection;

#[derive(Error, Debug)]
pub enum AssignError {
    #[error("Precondition failed: {message}")]
    PreconditionError { message: String },

    #[error("Assignment rejected: {0}")]
    ConflictError(Rejection),

    #[error("Persistence call failed for module {module_id}: {message}")]
    PersistenceError { module_id: String, message: String },

    #[error("Backend responded with status {status} for {endpoint}")]
    BackendStatusError { endpoint: String, status: u16 },

    #[error("{entity} not found: {id}")]
    NotFoundError { entity: String, id: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Validation,
    Persistence,
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AssignError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AssignError::PreconditionError { .. } => ErrorCategory::Precondition,
            AssignError::ConflictError(_) => ErrorCategory::Validation,
            AssignError::PersistenceError { .. } => ErrorCategory::Persistence,
            AssignError::BackendStatusError { .. } | AssignError::ApiError(_) => {
                ErrorCategory::Network
            }
            AssignError::NotFoundError { .. }
            | AssignError::CsvError(_)
            | AssignError::SerializationError(_) => ErrorCategory::Data,
            AssignError::ConfigError { .. }
            | AssignError::ConfigValidationError { .. }
            | AssignError::InvalidConfigValueError { .. }
            | AssignError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AssignError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Persistence | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Precondition | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AssignError::PreconditionError { .. } => {
                "Generate the block's catalog and assignment data before assigning manually".to_string()
            }
            AssignError::ConflictError(_) => {
                "Choose another lecturer or release the conflicting assignment first".to_string()
            }
            AssignError::PersistenceError { .. }
            | AssignError::BackendStatusError { .. }
            | AssignError::ApiError(_) => {
                "Check that the backend is reachable and retry the operation".to_string()
            }
            AssignError::NotFoundError { entity, .. } => {
                format!("Reload the engine; the {} may have been removed", entity.to_lowercase())
            }
            AssignError::CsvError(_) | AssignError::SerializationError(_) => {
                "Verify the data format returned by the backend or fixture file".to_string()
            }
            AssignError::IoError(_) => "Check file paths and permissions".to_string(),
            AssignError::ConfigError { .. }
            | AssignError::ConfigValidationError { .. }
            | AssignError::InvalidConfigValueError { .. }
            | AssignError::MissingConfigError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AssignError::PreconditionError { message } => message.clone(),
            AssignError::ConflictError(rejection) => rejection.to_string(),
            AssignError::PersistenceError { module_id, .. } => {
                format!("Could not save the change for module {}", module_id)
            }
            AssignError::BackendStatusError { status, .. } => {
                format!("The assignment service answered with an error ({})", status)
            }
            AssignError::ApiError(_) => "The assignment service could not be reached".to_string(),
            AssignError::NotFoundError { entity, id } => format!("{} '{}' does not exist", entity, id),
            AssignError::CsvError(_) => "Failed to write the CSV export".to_string(),
            AssignError::SerializationError(_) => "Received malformed data".to_string(),
            AssignError::IoError(e) => format!("File system error: {}", e),
            AssignError::ConfigError { message } => format!("Configuration problem: {}", message),
            AssignError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            AssignError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            AssignError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
        }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        AssignError::NotFoundError {
            entity: entity.to_string(),
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let precondition = AssignError::PreconditionError {
            message: "block 2 has not been generated".to_string(),
        };
        assert_eq!(precondition.category(), ErrorCategory::Precondition);
        assert_eq!(precondition.severity(), ErrorSeverity::High);
        assert_eq!(precondition.user_friendly_message(), "block 2 has not been generated");

        let persistence = AssignError::PersistenceError {
            module_id: "m-1".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(persistence.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_not_found_message() {
        let err = AssignError::not_found("Lecturer", "L-9");
        assert_eq!(err.to_string(), "Lecturer not found: L-9");
        assert!(err.recovery_suggestion().contains("lecturer"));
    }
}
