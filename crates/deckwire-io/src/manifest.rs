//! Mapping manifest and device auto-detection.
//!
//! The host keeps an ordered list of available mappings; connecting a device
//! whose name matches exactly one entry triggers an automatic load.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One available mapping: display name, document file, and the device
/// identifier it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub filename: String,
    pub id: String,
}

/// Ordered list of mapping choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(src: &str) -> Result<Self> {
        serde_json::from_str(src).map_err(|e| Error::Manifest(e.to_string()))
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Picks the mapping to auto-load for a connected device.
    ///
    /// A device name matches an entry when it contains the entry's `id` or
    /// `name`, case-insensitively. Returns a hit only when exactly one entry
    /// matches; zero or ambiguous candidates leave the choice to the user.
    pub fn detect(&self, device_name: &str) -> Option<&ManifestEntry> {
        let device = device_name.to_lowercase();
        let mut candidates = self.entries.iter().filter(|entry| {
            device.contains(&entry.id.to_lowercase()) || device.contains(&entry.name.to_lowercase())
        });
        let first = candidates.next()?;
        if candidates.next().is_some() {
            tracing::debug!(device = device_name, "ambiguous mapping auto-detect");
            return None;
        }
        Some(first)
    }
}
