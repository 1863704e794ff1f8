//! Transport layer for deckwire.
//!
//! Defines the [`MidiTransport`] seam the engine depends on, a hardware
//! backend via midir (feature `midi-io`, default on), and the mapping
//! manifest used for device auto-detection.

pub mod error;
pub use error::{Error, Result};

pub mod transport;
pub use transport::{LoopbackTransport, MidiTransport};

pub mod manifest;
pub use manifest::{Manifest, ManifestEntry};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidiInputDevice, MidiOutputDevice};
