//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// Row numbers are 1-based positions in the input row sequence.
    #[error("row {row}: missing required field 'resource_name'")]
    MissingResourceName { row: usize },

    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
