use thiserror::Error;

use crate::lock::LockError;
use crate::predicate::PredicateError;

/// Errors raised by the store, the resolver and the update pipeline.
///
/// Plain absence of a record is never an error at the store layer; lookups
/// return `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("the resource with ID '{id}' of type '{type_id}' was not found")]
    ResourceNotFound { type_id: String, id: String },

    #[error(
        "object {id} has a different version than expected (expected: {expected}, actual: {actual})"
    )]
    ConcurrentModification {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("unsupported update action '{action}' for {type_id}; supported actions: {}", supported.join(", "))]
    InvalidAction {
        type_id: String,
        action: String,
        supported: Vec<String>,
    },

    #[error(transparent)]
    InvalidQuery(#[from] PredicateError),

    #[error("a {type_id} with key '{key}' already exists (id {owner})")]
    DuplicateKey {
        type_id: String,
        key: String,
        owner: String,
    },

    #[error("a {type_id} referenced by {identifier} could not be found")]
    ReferenceNotResolved { type_id: String, identifier: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        StoreError::InvalidInput(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        StoreError::InvalidOperation(message.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
