//! Dataset kinds and their storage collections

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of dataset kinds
///
/// Each kind maps to exactly one storage collection. References whose kind
/// label does not map to a kind are ignored during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    /// Unit process or system process
    Process,
    /// Elementary, product or waste flow
    Flow,
    /// Literature or data source
    Source,
    /// Person or organisation
    Contact,
    /// Group of convertible units
    UnitGroup,
    /// Physical property of a flow
    FlowProperty,
    /// Model composed of linked processes
    LifeCycleModel,
}

impl DatasetKind {
    /// All kinds, in declaration order
    pub const ALL: [DatasetKind; 7] = [
        DatasetKind::Process,
        DatasetKind::Flow,
        DatasetKind::Source,
        DatasetKind::Contact,
        DatasetKind::UnitGroup,
        DatasetKind::FlowProperty,
        DatasetKind::LifeCycleModel,
    ];

    /// Short label used in identity strings
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Process => "process",
            DatasetKind::Flow => "flow",
            DatasetKind::Source => "source",
            DatasetKind::Contact => "contact",
            DatasetKind::UnitGroup => "unit-group",
            DatasetKind::FlowProperty => "flow-property",
            DatasetKind::LifeCycleModel => "life-cycle-model",
        }
    }

    /// Storage collection holding records of this kind
    #[inline]
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            DatasetKind::Process => "processes",
            DatasetKind::Flow => "flows",
            DatasetKind::Source => "sources",
            DatasetKind::Contact => "contacts",
            DatasetKind::UnitGroup => "unitgroups",
            DatasetKind::FlowProperty => "flowproperties",
            DatasetKind::LifeCycleModel => "lifecyclemodels",
        }
    }

    /// ILCD `@type` label written into reference elements
    #[inline]
    #[must_use]
    pub fn type_label(self) -> &'static str {
        match self {
            DatasetKind::Process => "process data set",
            DatasetKind::Flow => "flow data set",
            DatasetKind::Source => "source data set",
            DatasetKind::Contact => "contact data set",
            DatasetKind::UnitGroup => "unit group data set",
            DatasetKind::FlowProperty => "flow property data set",
            DatasetKind::LifeCycleModel => "lifeCycleModel data set",
        }
    }

    /// Resolve a kind from any accepted label
    ///
    /// Accepts short labels (`unit-group`), ILCD type labels
    /// (`unit group data set`) and collection names (`unitgroups`),
    /// ignoring case, spaces, dashes and underscores.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        let normalized: String = lowered
            .trim_end_matches("data set")
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();

        let kind = match normalized.as_str() {
            "process" | "processes" => DatasetKind::Process,
            "flow" | "flows" => DatasetKind::Flow,
            "source" | "sources" => DatasetKind::Source,
            "contact" | "contacts" => DatasetKind::Contact,
            "unitgroup" | "unitgroups" => DatasetKind::UnitGroup,
            "flowproperty" | "flowproperties" => DatasetKind::FlowProperty,
            "lifecyclemodel" | "lifecyclemodels" => DatasetKind::LifeCycleModel,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DatasetKind {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| DatasetError::UnknownKind(s.to_string()))
    }
}
