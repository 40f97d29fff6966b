//! Error types for reference resolution
//!
//! Three failure classes reach callers:
//! - Store failures other than a missing record (network, decoding)
//! - Queue failures (a task vanished before reporting its result)
//! - Configuration errors
//!
//! A missing record is not an error at this level: the resolver records it
//! as a nonexistent reference and keeps going.

use lca_dataset::RefPointer;

/// Errors returned by a [`RefStore`](crate::RefStore)
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the requested identity
    #[error("record not found: {0}")]
    NotFound(RefPointer),

    /// Backend unreachable or refused the request
    #[error("store backend failure: {0}")]
    Backend(String),

    /// Backend answered with data that could not be decoded
    #[error("failed to decode record {pointer}: {message}")]
    Decode {
        /// Identity being decoded
        pointer: RefPointer,
        /// Decoder message
        message: String,
    },
}

impl StoreError {
    /// Create backend failure
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create decode failure for pointer
    #[inline]
    pub fn decode(pointer: RefPointer, message: impl Into<String>) -> Self {
        Self::Decode {
            pointer,
            message: message.into(),
        }
    }

    /// Whether this is the recoverable missing-record case
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors observed when awaiting a queued task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Task panicked or was dropped before producing a result
    #[error("queued task aborted before completion")]
    TaskAborted,
}

/// Errors that abort a whole resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Unexpected store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Queued fetch task did not complete
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Invalid resolver configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    /// Create configuration error
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the store layer caused the failure
    #[inline]
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lca_dataset::DatasetKind;
    use uuid::Uuid;

    #[test]
    fn not_found_is_recoverable() {
        let pointer = RefPointer::new(DatasetKind::Flow, Uuid::from_u128(1), "1.0");
        assert!(StoreError::NotFound(pointer.clone()).is_not_found());
        assert!(!StoreError::backend("timeout").is_not_found());
        assert!(!StoreError::decode(pointer, "bad json").is_not_found());
    }

    #[test]
    fn resolve_error_display() {
        let err: ResolveError = StoreError::backend("connection reset").into();
        assert!(err.is_store_failure());
        assert!(err.to_string().contains("connection reset"));

        let err: ResolveError = QueueError::TaskAborted.into();
        assert!(!err.is_store_failure());
        assert!(err.to_string().contains("aborted"));

        let err = ResolveError::config("level_concurrency must be at least 1");
        assert!(err.to_string().starts_with("configuration error"));
    }
}
