//! Error types for the variation engine library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::VariationStatus;

/// Comprehensive error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Variation not found for the given ID
    #[error("Variation with ID {id} not found")]
    VariationNotFound { id: u64 },
    /// Milestone not found for the given ID
    #[error("Milestone with ID {id} not found")]
    MilestoneNotFound { id: u64 },
    /// Milestone impact row not found for the given ID
    #[error("Milestone impact with ID {id} not found")]
    ImpactNotFound { id: u64 },
    /// Operation attempted from a status that does not permit it
    #[error("Cannot {operation} a variation in status '{status}'")]
    InvalidState {
        operation: String,
        status: VariationStatus,
    },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EngineError {
    /// Creates a new database error with additional context.
    pub fn database_error(message: &str, source: rusqlite::Error) -> Self {
        Self::Database {
            message: message.into(),
            source,
        }
    }

    /// Creates an invalid-state error for a rejected transition.
    pub fn invalid_state(operation: impl Into<String>, status: VariationStatus) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            status,
        }
    }

    /// Creates an input validation error for a field.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Extension trait for mapping database Results with a message.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| EngineError::database_error(message, e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message_names_status() {
        let err = EngineError::invalid_state("apply", VariationStatus::Applied);
        assert_eq!(
            err.to_string(),
            "Cannot apply a variation in status 'applied'"
        );
    }

    #[test]
    fn test_invalid_input_message_names_field() {
        let err = EngineError::invalid_input("impact_summary", "summary must not be empty");
        assert!(err.to_string().contains("impact_summary"));
        assert!(err.to_string().contains("summary must not be empty"));
    }

    #[test]
    fn test_db_context_maps_source() {
        let res: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::QueryReturnedNoRows);
        let err = res.db_context("Failed to query variation").unwrap_err();
        match err {
            EngineError::Database { message, .. } => {
                assert_eq!(message, "Failed to query variation");
            }
            _ => panic!("Expected Database error"),
        }
    }
}
