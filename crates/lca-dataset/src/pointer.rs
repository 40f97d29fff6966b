//! Reference pointers identifying one dataset record

use crate::error::DatasetError;
use crate::kind::DatasetKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// `(kind, id, version)` triple identifying one dataset record
///
/// Equality, hashing and ordering are structural over all three fields.
/// The textual form is `id:version:kind`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RefPointer {
    /// Dataset kind
    pub kind: DatasetKind,
    /// Dataset identifier
    pub id: Uuid,
    /// Dotted version string
    pub version: String,
}

impl RefPointer {
    /// Create new pointer
    #[inline]
    #[must_use]
    pub fn new(kind: DatasetKind, id: Uuid, version: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            version: version.into(),
        }
    }

    /// Same id and version, ignoring kind
    ///
    /// Classification buckets and problem lists deduplicate on this key.
    #[inline]
    #[must_use]
    pub fn same_revision(&self, other: &RefPointer) -> bool {
        self.id == other.id && self.version == other.version
    }

    /// Key used when kind is not part of the identity
    #[inline]
    #[must_use]
    pub fn revision_key(&self) -> (Uuid, &str) {
        (self.id, self.version.as_str())
    }
}

impl fmt::Display for RefPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.version, self.kind)
    }
}

impl FromStr for RefPointer {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(id), Some(version), Some(kind)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DatasetError::MalformedIdentity(s.to_string()));
        };

        let id = Uuid::parse_str(id).map_err(|e| DatasetError::invalid_id(id, &e))?;
        if version.is_empty() {
            return Err(DatasetError::EmptyVersion(s.to_string()));
        }
        let kind = kind.parse::<DatasetKind>()?;

        Ok(Self::new(kind, id, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RefPointer {
        RefPointer::new(DatasetKind::UnitGroup, Uuid::from_u128(7), "01.00.000")
    }

    #[test]
    fn display_and_parse_agree() {
        let pointer = sample();
        let text = pointer.to_string();
        assert!(text.ends_with(":01.00.000:unit-group"));
        assert_eq!(text.parse::<RefPointer>().unwrap(), pointer);
    }

    #[test]
    fn parse_rejects_malformed_identities() {
        assert!(matches!(
            "only-one-part".parse::<RefPointer>(),
            Err(DatasetError::MalformedIdentity(_))
        ));
        assert!(matches!(
            "not-a-uuid:1.0:flow".parse::<RefPointer>(),
            Err(DatasetError::InvalidId { .. })
        ));

        let id = Uuid::from_u128(1);
        assert!(matches!(
            format!("{id}::flow").parse::<RefPointer>(),
            Err(DatasetError::EmptyVersion(_))
        ));
        assert!(matches!(
            format!("{id}:1.0:widget").parse::<RefPointer>(),
            Err(DatasetError::UnknownKind(_))
        ));
    }

    #[test]
    fn same_revision_ignores_kind() {
        let a = sample();
        let mut b = sample();
        b.kind = DatasetKind::Flow;

        assert_ne!(a, b);
        assert!(a.same_revision(&b));
        assert_eq!(a.revision_key(), b.revision_key());
    }
}
