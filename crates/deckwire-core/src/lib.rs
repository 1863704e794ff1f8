//! Core types for the deckwire mapping engine.
//!
//! Wire-level MIDI message representation, the semantic [`Action`] stream
//! emitted toward the host, and deck addressing helpers. No I/O here.

pub mod action;
pub mod group;
pub mod message;

pub use action::{Action, PressControl, ValueControl};
pub use group::deck_from_group;
pub use message::{MessageClass, MidiMessage};
