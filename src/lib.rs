//! # deckwire - DJ controller mapping engine
//!
//! Translates raw MIDI byte streams from physical DJ controllers into a
//! small, stable set of semantic actions (play, cue, rate, volume, jog,
//! crossfader, loops, EQ) by executing third-party mapping documents in
//! Mixxx's controller format, including their JavaScript controller scripts.
//!
//! ## Architecture
//!
//! deckwire is an umbrella crate coordinating:
//! - **deckwire-core** - MIDI messages, semantic actions, deck addressing
//! - **deckwire-mapping** - XML mapping parser, JS script sandbox, stateful
//!   message decoder, action resolver/dispatcher
//! - **deckwire-io** - transport seam, hardware I/O via midir, mapping
//!   manifest and auto-detection
//!
//! ## Quick start
//!
//! ```ignore
//! use deckwire::{ControllerSession, MidiMessage};
//!
//! let mut session = ControllerSession::new();
//! session.load_mapping(&xml_source, |file| load_script(file))?;
//!
//! for action in session.feed(MidiMessage::new(0x90, &[11, 127])) {
//!     apply(action); // Press { control: Play, deck: Some(1), down: true }
//! }
//! ```
//!
//! ## Feature flags
//!
//! - `midi-io` (default) - hardware MIDI I/O via midir; disable for pure
//!   in-process parsing/decoding.

pub use deckwire_core as core;
pub use deckwire_core::{Action, MessageClass, MidiMessage, PressControl, ValueControl};

pub use deckwire_mapping as mapping;
pub use deckwire_mapping::{
    ControlMapping, ControllerMapping, Decoder, MappingDocument, MappingInfo, OutputMapping,
    Resolution, Sandbox, ScriptFile,
};

pub use deckwire_io as io;
pub use deckwire_io::{LoopbackTransport, Manifest, ManifestEntry, MidiTransport};

#[cfg(feature = "midi-io")]
pub use deckwire_io::{MidiInputDevice, MidiOutputDevice};

pub mod error;
pub use error::{Error, Result};

mod session;
pub use session::ControllerSession;
