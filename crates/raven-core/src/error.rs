//! Error types for raven operations.
//!
//! Every failure carries a stable [`ErrorCode`] so transports can map errors
//! without matching on message text.

use thiserror::Error;

/// Result type alias for raven operations.
pub type RavenResult<T> = Result<T, RavenError>;

/// Main error type for all raven operations.
#[derive(Error, Debug)]
pub enum RavenError {
    /// Missing or invalid configuration. Fatal at start-up.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// State or memory storage failed. Fatal to the current turn.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generation service failed. Aborts the reply of the current turn.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Speech-to-text or text-to-speech failed.
    #[error("Speech error: {message}")]
    Speech { message: String, code: ErrorCode },

    /// Outbound delivery failed (voice attachment, proactive outreach).
    #[error("Delivery error: {message}")]
    Delivery {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Job scheduler failed.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgMissingCredentials,
    CfgInvalidValue,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbStateMissing,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Speech (SPC_xxx)
    SpcTranscriptionFailed,
    SpcSynthesisFailed,

    // Delivery (DLV_xxx)
    DlvTransient,
    DlvRejected,

    // Scheduler
    SchedulerFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgMissingCredentials => "CFG_001",
            ErrorCode::CfgInvalidValue => "CFG_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbStateMissing => "DB_003",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::SpcTranscriptionFailed => "SPC_001",
            ErrorCode::SpcSynthesisFailed => "SPC_002",
            ErrorCode::DlvTransient => "DLV_001",
            ErrorCode::DlvRejected => "DLV_002",
            ErrorCode::SchedulerFailed => "SCH_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl RavenError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a validation error for a required field that was not provided.
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValMissingField,
            suggestion: None,
        }
    }

    /// Create a configuration error for a missing credential.
    pub fn missing_credential(name: &str) -> Self {
        Self::Configuration(format!("{} is not set", name))
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an LLM error for a request that never got an answer.
    pub fn llm_connection(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmConnectionFailed,
            source: None,
        }
    }

    /// Create an LLM error for a response without text.
    pub fn empty_response() -> Self {
        Self::Llm {
            message: "Generation returned no text".to_string(),
            code: ErrorCode::LlmEmptyResponse,
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a speech error for a failed transcription.
    pub fn transcription(message: impl Into<String>) -> Self {
        Self::Speech {
            message: message.into(),
            code: ErrorCode::SpcTranscriptionFailed,
        }
    }

    /// Create a speech error for a failed synthesis.
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Speech {
            message: message.into(),
            code: ErrorCode::SpcSynthesisFailed,
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            code: ErrorCode::DlvTransient,
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgMissingCredentials,
            Self::UnsupportedProvider { .. } => ErrorCode::CfgInvalidValue,
            Self::Validation { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Speech { code, .. } => *code,
            Self::Delivery { code, .. } => *code,
            Self::Scheduler(_) => ErrorCode::SchedulerFailed,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether the failed operation may succeed if attempted again.
    ///
    /// Only generation failures are retried; storage and delivery are single-attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Llm { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => {
                Some("Please set the required environment variables (see .env.example)")
            }
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::Database { .. } => Some("Please check that the database file is writable"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RavenError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = RavenError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_only_llm_errors_are_retryable() {
        assert!(RavenError::llm("timeout").is_retryable());
        assert!(RavenError::empty_response().is_retryable());
        assert!(!RavenError::database("locked").is_retryable());
        assert!(!RavenError::delivery("chat not found").is_retryable());
    }

    #[test]
    fn test_connection_failures_are_retryable() {
        let err = RavenError::llm_connection("timed out");
        assert_eq!(err.code().as_str(), "LLM_001");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_field_code() {
        assert_eq!(RavenError::missing_field("key").code().as_str(), "VAL_002");
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::CfgMissingCredentials.as_str(), "CFG_001");
        assert_eq!(ErrorCode::LlmGenerationFailed.as_str(), "LLM_002");
        assert_eq!(
            RavenError::missing_credential("OPENAI_API_KEY").code().as_str(),
            "CFG_001"
        );
    }
}
