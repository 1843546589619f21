//! # AppError
//!
//! Centralized error handling for the forum backend.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., User, Forum, Thread, Post)
    #[error("Can't find {0} by {1}")]
    NotFound(String, String),

    /// Malformed input (e.g., unknown sort mode, bad cursor, bad voice)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Semantic conflict (e.g., duplicate slug, parent post in another thread)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, poisoned lock)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, key: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), key.to_string())
    }
}

/// A specialized Result type for forum logic.
pub type Result<T> = std::result::Result<T, AppError>;
