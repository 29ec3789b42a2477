//! The relocation table built by discovery.

use std::collections::BTreeMap;

use jvm_classfile::NameMapper;
use serde::Serialize;

use crate::error::{RelocationError, Result};

/// Ordered map from a marked class's internal name to its relocated name.
///
/// Filled during discovery, then handed to the later phases by shared
/// reference. Both directions are kept unique: a second registration of the
/// same original name, or of the same relocated name, is rejected.
///
/// Serializes as a plain `{ original: relocated }` JSON object.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct RelocationTable {
    entries: BTreeMap<String, String>,
    /// original -> storage path it was discovered at
    #[serde(skip)]
    sources: BTreeMap<String, String>,
    /// relocated -> original
    #[serde(skip)]
    targets: BTreeMap<String, String>,
}

impl RelocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `original -> relocated`, discovered at storage path `source`.
    pub fn insert(&mut self, original: &str, relocated: &str, source: &str) -> Result<()> {
        if let Some(first) = self.sources.get(original) {
            return Err(RelocationError::DuplicateClass {
                name: original.to_string(),
                first: first.clone(),
                second: source.to_string(),
            });
        }
        if let Some(first) = self.targets.get(relocated) {
            return Err(RelocationError::DuplicateClass {
                name: relocated.to_string(),
                first: first.clone(),
                second: original.to_string(),
            });
        }

        self.entries
            .insert(original.to_string(), relocated.to_string());
        self.sources
            .insert(original.to_string(), source.to_string());
        self.targets
            .insert(relocated.to_string(), original.to_string());
        Ok(())
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn contains(&self, original: &str) -> bool {
        self.entries.contains_key(original)
    }

    /// Storage path the entry for `original` was discovered at.
    pub fn source_path(&self, original: &str) -> Option<&str> {
        self.sources.get(original).map(String::as_str)
    }

    /// Entries in internal-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameMapper for RelocationTable {
    fn map_name(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}
