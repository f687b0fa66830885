//! # Error Types
//!
//! Domain-specific error types for estate-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  estate-core errors (this file)                                        │
//! │  ├── CoreError        - Rule violations on records and queries         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  estate-db errors                                                      │
//! │  └── DbError          - SQLite operation failures                      │
//! │                                                                         │
//! │  estate-client errors                                                  │
//! │  ├── StoreError / AuthError - What the store ports report              │
//! │  └── ClientError      - What controllers hand back and report          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → StoreError → ClientError │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Rule violations on records and queries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A partial update tried to touch a field the store owns.
    ///
    /// ## When This Occurs
    /// - Updating `id`, `userRef` or `timestamp` of a listing
    /// - Updating `id` of a user document
    #[error("Field '{field}' of {collection} cannot be modified")]
    ImmutableField { collection: String, field: String },

    /// The collection cannot serve the requested operation.
    ///
    /// ## When This Occurs
    /// - Paging through `users` (only listings are paged)
    #[error("{collection} does not support {operation}")]
    UnsupportedOperation {
        collection: String,
        operation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
