//! Store-specific error types
//!
//! This module defines all error types that can occur while talking to the
//! embedded collection store. Failures are propagated to callers unmodified;
//! this layer adds no retry logic or translation.
//!
//! # Error Types
//!
//! - **`SledError`**: Errors from the underlying sled embedded database
//! - **`DecodeError`**: Failures when deserializing data from the store
//! - **`EncodeError`**: Failures when serializing data to the store
//! - **`KeyError`**: A tree key that is not valid UTF-8
//! - **`DocumentNotFound`**: Reload of a document the store no longer holds
//! - **`InvalidPipeline`**: Aggregation stages applied in an impossible order
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use thiserror::Error;

/// Store-specific errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Represents a sled database error
    #[error("Store error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// A tree key could not be read back as UTF-8
    #[error("Invalid key: {0}")]
    KeyError(String),

    /// Document is not present in the collection
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Aggregation pipeline stages in an order the store cannot execute
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
