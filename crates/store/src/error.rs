use common::{AggregateId, Version};
use thiserror::Error;

/// Errors that can occur when interacting with a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record with this identifier exists.
    #[error("{aggregate_type} not found: {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: AggregateId,
    },

    /// A record with the same identity or unique key is already stored.
    #[error("Duplicate {aggregate_type}: {key}")]
    Duplicate {
        aggregate_type: &'static str,
        key: String,
    },

    /// The stored version did not match the version the caller loaded.
    #[error(
        "Concurrency conflict for {aggregate_type} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        id: AggregateId,
        expected: Version,
        actual: Version,
    },
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;
