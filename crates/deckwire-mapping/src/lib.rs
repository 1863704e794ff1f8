//! Mapping engine core for deckwire.
//!
//! Parses Mixxx-format controller mapping documents, sandboxes their
//! JavaScript controller scripts, decodes raw MIDI messages against the
//! mapped controls, and resolves everything into semantic [`Action`]s.
//!
//! [`Action`]: deckwire_core::Action

pub mod error;
pub use error::{Error, Result};

pub mod document;
pub use document::{
    ControlMapping, MappingDocument, MappingInfo, OutputMapping, Resolution, ScriptFile,
};

pub mod parser;

pub mod decoder;
pub use decoder::{Decoded, Decoder};

pub mod resolver;

pub mod script;
pub use script::Sandbox;

mod mapping;
pub use mapping::ControllerMapping;
