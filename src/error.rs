//! Error type for fallible collection operations.
//!
//! Most operators cannot fail: missing paths resolve to `null` and boundary
//! arguments (`take(-n)`, `chunk(0)`) have defined results. The variants below
//! cover the few places where the caller asked for something impossible.

use thiserror::Error;

/// Errors raised by collection construction and terminal operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A started, single-pass cursor was passed where a replayable source is
    /// required. Pass a factory closure instead.
    #[error("cursors cannot be replayed; pass a factory closure that creates the cursor instead")]
    InvalidSource,

    /// No element satisfied the request (`first_or_fail`, `sole`).
    #[error("item not found")]
    ItemNotFound,

    /// `sole` matched more than one element.
    #[error("{0} items were found")]
    MultipleItemsFound(usize),

    /// An argument is outside the range the operation supports.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization to JSON text failed.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollectionError>;
