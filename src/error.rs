//! Error taxonomy for the advisor core
//!
//! Construction-time errors (`Schema`, `DataIntegrity`) abort range-table
//! construction. Per-request errors (`Validation`, `InvalidProbabilities`)
//! abort a single recommendation and never touch the shared context.
//!
//! An unknown crop is not an error: the explainer degrades to a sentinel
//! explanation instead (see `explanation::explain_crop`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Dataset is missing a required column
    #[error("schema error: dataset is missing required column '{column}'")]
    Schema { column: String },

    /// Dataset content cannot produce a well-defined range table
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// User input is missing a field or carries a non-numeric value
    #[error("validation error: field '{field}' is {reason}")]
    Validation { field: String, reason: String },

    /// Classifier output does not line up with its class labels
    #[error("invalid probability vector: {0}")]
    InvalidProbabilities(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AdvisorError {
    pub fn missing(field: impl Into<String>) -> Self {
        AdvisorError::Validation {
            field: field.into(),
            reason: "missing".to_string(),
        }
    }

    pub fn not_a_number(field: impl Into<String>) -> Self {
        AdvisorError::Validation {
            field: field.into(),
            reason: "not a number".to_string(),
        }
    }

    /// True for errors scoped to a single request
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AdvisorError::Validation { .. } | AdvisorError::InvalidProbabilities(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = AdvisorError::missing("rainfall");
        assert_eq!(err.to_string(), "validation error: field 'rainfall' is missing");
        assert!(err.is_request_error());
    }

    #[test]
    fn test_schema_is_not_request_scoped() {
        let err = AdvisorError::Schema { column: "ph".to_string() };
        assert!(err.to_string().contains("'ph'"));
        assert!(!err.is_request_error());
    }

    #[test]
    fn test_polars_error_is_internal() {
        let err: AdvisorError =
            polars::prelude::PolarsError::ColumnNotFound("rainfall".into()).into();
        assert!(matches!(err, AdvisorError::Polars(_)));
        assert!(err.to_string().contains("rainfall"));
        assert!(!err.is_request_error());
    }
}
