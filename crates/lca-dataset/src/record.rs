//! Fetched dataset records and lifecycle stages

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle stage decoded from a record's state code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewStage {
    /// Draft, not yet submitted (`< 20`)
    Draft,
    /// Submitted and mid-review (`20..100`)
    UnderReview,
    /// Published (`100`)
    Released,
    /// Second release tier, e.g. co-authored candidates (`200` and other codes above 100)
    CandidateRelease,
}

impl ReviewStage {
    /// Lower bound of the review range
    pub const UNDER_REVIEW_FROM: i32 = 20;
    /// State code of a published record
    pub const RELEASED: i32 = 100;

    /// Decode a state code
    #[must_use]
    pub fn from_state_code(code: i32) -> Self {
        match code {
            c if c < Self::UNDER_REVIEW_FROM => ReviewStage::Draft,
            c if c < Self::RELEASED => ReviewStage::UnderReview,
            Self::RELEASED => ReviewStage::Released,
            _ => ReviewStage::CandidateRelease,
        }
    }

    /// Released in either tier; traversal never descends into final records
    #[inline]
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, ReviewStage::Released | ReviewStage::CandidateRelease)
    }
}

/// Record fetched for one [`RefPointer`](crate::RefPointer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    /// Raw lifecycle state code
    pub state_code: i32,
    /// Whether the record passed rule verification
    pub rule_verification: bool,
    /// Dataset body; may embed further references
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl DatasetRecord {
    /// Create new record
    #[inline]
    #[must_use]
    pub fn new(state_code: i32, rule_verification: bool, payload: serde_json::Value) -> Self {
        Self {
            state_code,
            rule_verification,
            payload,
        }
    }

    /// Decoded lifecycle stage
    #[inline]
    #[must_use]
    pub fn stage(&self) -> ReviewStage {
        ReviewStage::from_state_code(self.state_code)
    }
}

/// Authoritative version summary returned by batch lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Dataset identifier
    pub id: Uuid,
    /// Authoritative version of this id
    pub version: String,
    /// Raw lifecycle state code of that version
    pub state_code: i32,
    /// Whether that version passed rule verification
    pub rule_verification: bool,
}

impl VersionRecord {
    /// Decoded lifecycle stage
    #[inline]
    #[must_use]
    pub fn stage(&self) -> ReviewStage {
        ReviewStage::from_state_code(self.state_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_boundaries() {
        assert_eq!(ReviewStage::from_state_code(-1), ReviewStage::Draft);
        assert_eq!(ReviewStage::from_state_code(0), ReviewStage::Draft);
        assert_eq!(ReviewStage::from_state_code(19), ReviewStage::Draft);
        assert_eq!(ReviewStage::from_state_code(20), ReviewStage::UnderReview);
        assert_eq!(ReviewStage::from_state_code(99), ReviewStage::UnderReview);
        assert_eq!(ReviewStage::from_state_code(100), ReviewStage::Released);
        assert_eq!(ReviewStage::from_state_code(200), ReviewStage::CandidateRelease);
    }

    #[test]
    fn final_stages() {
        assert!(!ReviewStage::Draft.is_final());
        assert!(!ReviewStage::UnderReview.is_final());
        assert!(ReviewStage::Released.is_final());
        assert!(ReviewStage::CandidateRelease.is_final());
    }

    #[test]
    fn record_deserializes_without_payload() {
        let record: DatasetRecord =
            serde_json::from_str(r#"{"stateCode": 100, "ruleVerification": true}"#).unwrap();
        assert_eq!(record.stage(), ReviewStage::Released);
        assert!(record.payload.is_null());
    }
}
