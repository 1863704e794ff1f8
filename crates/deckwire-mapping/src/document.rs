//! In-memory model of a parsed controller mapping.
//!
//! Immutable once parsed; one instance per loaded mapping, living for the
//! active device session.

use serde::Serialize;
use std::collections::HashSet;

/// Value resolution of a mapped control.
///
/// High resolution means a 14-bit value split across two consecutive 7-bit
/// messages. This is a pure function of the control number, never a parser
/// flag: the Mixxx convention reserves control numbers 32-63 for the LSB
/// half of 14-bit encoder pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Low,
    High,
}

impl Resolution {
    pub fn from_midino(midino: u8) -> Self {
        if (32..=63).contains(&midino) {
            Resolution::High
        } else {
            Resolution::Low
        }
    }
}

/// Metadata about the mapping.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

/// A procedural source referenced by the mapping and the namespace its
/// exported handlers register under.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptFile {
    pub file_name: String,
    pub function_prefix: Option<String>,
}

/// One incoming control mapping: wire address plus logical target key.
#[derive(Debug, Clone, Serialize)]
pub struct ControlMapping {
    pub group: String,
    pub key: String,
    pub status: u8,
    pub midino: u8,
    /// Lowercased child-element names of `<options>`.
    pub options: HashSet<String>,
    pub resolution: Resolution,
}

impl ControlMapping {
    #[inline]
    pub fn matches(&self, status: u8, midino: u8) -> bool {
        self.status == status && self.midino == midino
    }

    /// Whether this control resolves through script dispatch instead of the
    /// static lookup tables.
    pub fn is_script_binding(&self) -> bool {
        self.options.contains("script-binding")
    }
}

/// One outgoing (host -> device) mapping. Captured structurally; no runtime
/// value shaping is implemented (extension point).
#[derive(Debug, Clone, Serialize)]
pub struct OutputMapping {
    pub group: String,
    pub key: String,
    pub status: u8,
    pub midino: u8,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub on: Option<u8>,
    pub off: Option<u8>,
}

/// A parsed controller mapping document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingDocument {
    pub info: MappingInfo,
    pub script_files: Vec<ScriptFile>,
    pub controls: Vec<ControlMapping>,
    pub outputs: Vec<OutputMapping>,
}

impl MappingDocument {
    /// First control in document order matching `(status, midino)`.
    /// Strict first-match: later duplicate entries are unreachable.
    pub fn find_control(&self, status: u8, midino: u8) -> Option<&ControlMapping> {
        self.controls.iter().find(|c| c.matches(status, midino))
    }
}
