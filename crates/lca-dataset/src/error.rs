//! Error types for dataset identities

/// Errors raised while parsing dataset identities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    /// Kind label does not name a known dataset collection
    #[error("unknown dataset kind: '{0}'")]
    UnknownKind(String),

    /// Identity string is not of the form `id:version:kind`
    #[error("malformed identity '{0}': expected id:version:kind")]
    MalformedIdentity(String),

    /// Identifier is not a UUID
    #[error("invalid dataset id '{value}': {reason}")]
    InvalidId {
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Version component is empty
    #[error("empty version in identity '{0}'")]
    EmptyVersion(String),
}

impl DatasetError {
    /// Create invalid id error from a uuid parse failure
    pub fn invalid_id(value: impl Into<String>, source: &uuid::Error) -> Self {
        Self::InvalidId {
            value: value.into(),
            reason: source.to_string(),
        }
    }
}
