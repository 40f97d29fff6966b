//! Reference extraction from dataset payloads
//!
//! Walks a JSON payload depth-first (objects and arrays only, primitives are
//! skipped) and collects every object that carries all three reference
//! fields with a kind label naming a known collection. Objects carrying only
//! some of the fields are malformed references and are skipped silently.
//!
//! `serde_json::Value` owns its children, so a payload can never revisit one
//! of its own nodes; repeated references are collapsed to their first
//! occurrence instead.

use crate::kind::DatasetKind;
use crate::pointer::RefPointer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// Payload keys naming the three reference fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReferenceFields {
    /// Key holding the referenced id
    pub id_key: String,
    /// Key holding the referenced version
    pub version_key: String,
    /// Key holding the referenced kind label
    pub kind_key: String,
}

impl ReferenceFields {
    /// Custom key names
    #[must_use]
    pub fn new(
        id_key: impl Into<String>,
        version_key: impl Into<String>,
        kind_key: impl Into<String>,
    ) -> Self {
        Self {
            id_key: id_key.into(),
            version_key: version_key.into(),
            kind_key: kind_key.into(),
        }
    }

    /// Plain `id` / `version` / `kind` keys
    #[must_use]
    pub fn plain() -> Self {
        Self::new("id", "version", "kind")
    }
}

impl Default for ReferenceFields {
    /// ILCD reference element attributes
    fn default() -> Self {
        Self::new("@refObjectId", "@version", "@type")
    }
}

/// Collect all references embedded in `payload`, in depth-first order
#[must_use]
pub fn extract_references(payload: &Value, fields: &ReferenceFields) -> Vec<RefPointer> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![payload];

    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                if let Some(pointer) = reference_in(map, fields) {
                    if seen.insert(pointer.clone()) {
                        found.push(pointer);
                    }
                }
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    found
}

fn reference_in(map: &Map<String, Value>, fields: &ReferenceFields) -> Option<RefPointer> {
    let id = map.get(&fields.id_key).and_then(Value::as_str);
    let version = map.get(&fields.version_key).and_then(Value::as_str);
    let kind = map.get(&fields.kind_key).and_then(Value::as_str);

    let (Some(id), Some(version), Some(kind)) = (id, version, kind) else {
        if id.is_some() || version.is_some() || kind.is_some() {
            tracing::trace!(?id, ?version, ?kind, "skipping partial reference");
        }
        return None;
    };

    let Some(kind) = DatasetKind::from_label(kind) else {
        tracing::trace!(kind, "skipping reference to unmapped kind");
        return None;
    };
    let Ok(id) = Uuid::parse_str(id.trim()) else {
        tracing::trace!(id, "skipping reference with non-uuid id");
        return None;
    };

    Some(RefPointer::new(kind, id, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ilcd_ref(kind: DatasetKind, n: u128, version: &str) -> Value {
        json!({
            "@refObjectId": Uuid::from_u128(n).to_string(),
            "@version": version,
            "@type": kind.type_label(),
            "common:shortDescription": [{"@xml:lang": "en", "#text": "ref"}]
        })
    }

    #[test]
    fn finds_nested_references() {
        let payload = json!({
            "processDataSet": {
                "processInformation": {
                    "dataSetInformation": {
                        "referenceToExternalDocumentation":
                            ilcd_ref(DatasetKind::Source, 1, "01.00.000")
                    }
                },
                "exchanges": {
                    "exchange": [
                        {"referenceToFlowDataSet": ilcd_ref(DatasetKind::Flow, 2, "01.00.000")},
                        {"referenceToFlowDataSet": ilcd_ref(DatasetKind::Flow, 3, "02.00.000")}
                    ]
                }
            }
        });

        let refs = extract_references(&payload, &ReferenceFields::default());
        let ids: Vec<u128> = refs.iter().map(|r| r.id.as_u128()).collect();

        assert_eq!(refs.len(), 3);
        assert!(ids.contains(&1));
        assert_eq!(refs.iter().filter(|r| r.kind == DatasetKind::Flow).count(), 2);
        let flow_order: Vec<u128> = refs
            .iter()
            .filter(|r| r.kind == DatasetKind::Flow)
            .map(|r| r.id.as_u128())
            .collect();
        assert_eq!(flow_order, vec![2, 3]);
    }

    #[test]
    fn repeated_references_are_collapsed() {
        let payload = json!([
            ilcd_ref(DatasetKind::Contact, 9, "1.0"),
            {"again": ilcd_ref(DatasetKind::Contact, 9, "1.0")},
            ilcd_ref(DatasetKind::Contact, 9, "1.1")
        ]);

        let refs = extract_references(&payload, &ReferenceFields::default());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].version, "1.0");
        assert_eq!(refs[1].version, "1.1");
    }

    #[test]
    fn partial_and_unknown_references_are_skipped() {
        let payload = json!({
            "missingVersion": {
                "@refObjectId": Uuid::from_u128(1).to_string(),
                "@type": "flow data set"
            },
            "unknownKind": {
                "@refObjectId": Uuid::from_u128(2).to_string(),
                "@version": "1.0",
                "@type": "widget data set"
            },
            "badId": {"@refObjectId": "not-a-uuid", "@version": "1.0", "@type": "flow data set"},
            "numbers": [1, 2, 3],
            "text": "@refObjectId"
        });

        assert!(extract_references(&payload, &ReferenceFields::default()).is_empty());
    }

    #[test]
    fn plain_field_names() {
        let payload = json!({
            "links": [{"id": Uuid::from_u128(4).to_string(), "version": "3", "kind": "unit-group"}]
        });

        let refs = extract_references(&payload, &ReferenceFields::plain());
        assert_eq!(
            refs,
            vec![RefPointer::new(DatasetKind::UnitGroup, Uuid::from_u128(4), "3")]
        );
        assert!(extract_references(&payload, &ReferenceFields::default()).is_empty());
    }

    #[test]
    fn primitives_have_no_references() {
        assert!(extract_references(&Value::Null, &ReferenceFields::default()).is_empty());
        assert!(extract_references(&json!("text"), &ReferenceFields::default()).is_empty());
    }
}
