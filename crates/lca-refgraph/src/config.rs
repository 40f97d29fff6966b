//! Resolver configuration

use crate::error::ResolveError;
use lca_dataset::ReferenceFields;
use serde::{Deserialize, Serialize};

/// Resolver configuration
///
/// Loadable from TOML:
///
/// ```toml
/// level_concurrency = 5
/// cache_capacity = 10000
///
/// [reference_fields]
/// id_key = "@refObjectId"
/// version_key = "@version"
/// kind_key = "@type"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Width of the task queue created for each traversal level
    ///
    /// Bounds sibling fetches only; concurrent levels each get their own
    /// queue, so total in-flight fetches can exceed this value.
    pub level_concurrency: usize,
    /// Capacity of the per-resolution record cache
    pub cache_capacity: u64,
    /// Payload keys identifying embedded references
    pub reference_fields: ReferenceFields,
}

impl ResolverConfig {
    /// Default queue width per traversal level
    pub const DEFAULT_LEVEL_CONCURRENCY: usize = 5;

    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML
    ///
    /// # Errors
    /// Returns `ResolveError::Config` if the document is invalid or fails validation
    pub fn from_toml_str(source: &str) -> Result<Self, ResolveError> {
        let config: Self = toml::from_str(source).map_err(|e| ResolveError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// With per-level queue width
    #[inline]
    #[must_use]
    pub fn with_level_concurrency(mut self, width: usize) -> Self {
        self.level_concurrency = width;
        self
    }

    /// With record cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With payload reference keys
    #[inline]
    #[must_use]
    pub fn with_reference_fields(mut self, fields: ReferenceFields) -> Self {
        self.reference_fields = fields;
        self
    }

    /// Check configuration invariants
    ///
    /// # Errors
    /// Returns `ResolveError::Config` on a zero queue width or empty field keys
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.level_concurrency == 0 {
            return Err(ResolveError::config("level_concurrency must be at least 1"));
        }
        let fields = &self.reference_fields;
        if fields.id_key.is_empty() || fields.version_key.is_empty() || fields.kind_key.is_empty()
        {
            return Err(ResolveError::config("reference field keys must not be empty"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            level_concurrency: Self::DEFAULT_LEVEL_CONCURRENCY,
            cache_capacity: 10_000,
            reference_fields: ReferenceFields::default(),
        }
    }
}
