//! Error types for the crashdq pipeline.
//!
//! Bad *data* is never an error here: missing identities, implausible
//! vehicle years and absent optional columns are classification outcomes.
//! The variants below describe malformed calls and I/O plumbing failures.

use thiserror::Error;

use crate::validation::ValidationError;

/// Main error type for crashdq operations.
#[derive(Debug, Error)]
pub enum CrashDqError {
    /// A column the rules depend on cannot be read as the type they need
    #[error("Structural input error in column '{column}': {detail}")]
    StructuralInput {
        /// Offending column
        column: String,
        /// What could not be read
        detail: String,
    },

    /// Configuration or argument error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },

    /// Batch document rejected by the schema-assertion step
    #[error("Batch validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        /// Operation that failed
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        /// Document being (de)serialized
        context: String,
        /// Underlying serde_json error
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with CrashDqError
pub type Result<T> = std::result::Result<T, CrashDqError>;

impl CrashDqError {
    /// Creates a structural input error for a column
    pub fn structural_input(column: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::StructuralInput {
            column: column.into(),
            detail: detail.into(),
        }
    }

    /// Creates a structural input error for a required column that is absent
    /// from the batch schema.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::StructuralInput {
            column: column.into(),
            detail: "required column is missing from the batch schema".to_string(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Returns true if this error signals a malformed batch rather than a
    /// plumbing failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralInput { .. } | Self::Validation(_))
    }
}
