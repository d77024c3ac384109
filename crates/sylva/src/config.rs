//! # Registry Configuration
//!
//! One TOML file lists every object type and its LOD settings:
//!
//! ```toml
//! worker_threads = 4
//!
//! [[types]]
//! id = 1
//! name = "pine"
//!
//! [types.lod]
//! lod_distance = 60.0
//! ground_anchored = true
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sylva_lod::ProxyTypeConfig;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::ProxyTypeId;

/// One configured object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeEntry {
    /// Registry key.
    pub id: ProxyTypeId,
    /// Human-readable name, used in logs and reports.
    pub name: String,
    /// LOD settings. Missing fields take their defaults.
    #[serde(default)]
    pub lod: ProxyTypeConfig,
}

/// Configuration for a whole registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Worker threads in the shared pool. 0 lets rayon pick.
    pub worker_threads: usize,
    /// Configured object types.
    pub types: Vec<TypeEntry>,
}

impl RegistryConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ConfigParse`] on malformed TOML
    /// - [`RegistryError::DuplicateType`] if an id appears twice
    /// - [`RegistryError::Config`] for an empty name
    /// - [`RegistryError::Lod`] if a type's LOD settings are out of range
    pub fn from_toml_str(source: &str) -> RegistryResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_path(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks ids are unique and every type's settings are valid.
    ///
    /// # Errors
    ///
    /// See [`from_toml_str`](Self::from_toml_str).
    pub fn validate(&self) -> RegistryResult<()> {
        let mut seen = BTreeSet::new();
        for entry in &self.types {
            if !seen.insert(entry.id) {
                return Err(RegistryError::DuplicateType(entry.id));
            }
            if entry.name.trim().is_empty() {
                return Err(RegistryError::Config(format!(
                    "proxy type {} has an empty name",
                    entry.id
                )));
            }
            entry.lod.validate()?;
        }
        Ok(())
    }

    /// Looks up a type entry.
    #[must_use]
    pub fn entry(&self, id: ProxyTypeId) -> Option<&TypeEntry> {
        self.types.iter().find(|entry| entry.id == id)
    }
}
