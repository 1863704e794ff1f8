//! Hardware MIDI I/O via midir. Requires the `midi-io` feature.

mod input;
mod output;

pub use input::MidiInputDevice;
pub use output::MidiOutputDevice;
