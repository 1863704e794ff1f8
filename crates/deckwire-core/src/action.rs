//! Semantic actions emitted toward the host application.
//!
//! Actions are ephemeral: created per incoming message, consumed
//! synchronously, never queued across messages.

use serde::{Deserialize, Serialize};

/// A momentary (button-like) control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PressControl {
    Play,
    Cue,
    StopAtStart,
    /// Halve/double the active loop.
    LoopResize { factor: f64 },
    /// Toggle a beat loop; `beats` is the loop length when the key names one.
    LoopToggle { beats: Option<u32> },
    Sync,
}

/// A continuous (fader/knob/wheel-like) control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueControl {
    Volume,
    Gain,
    Crossfader,
    Rate,
    Jog,
    Lows,
    Mids,
    Highs,
}

/// Canonical deck-relative event delivered to the host.
///
/// `deck` is derived from the mapping group (`[ChannelN]`); controls without
/// a deck address (e.g. the crossfader) carry `None` and are still delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Press {
        control: PressControl,
        deck: Option<u8>,
        down: bool,
    },
    Value {
        control: ValueControl,
        deck: Option<u8>,
        value: f64,
    },
}

impl Action {
    pub fn deck(&self) -> Option<u8> {
        match self {
            Action::Press { deck, .. } | Action::Value { deck, .. } => *deck,
        }
    }
}
