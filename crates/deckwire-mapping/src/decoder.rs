//! Stateful message decoder.
//!
//! Reconstructs channel, status class, and a resolution-aware numeric value
//! from one raw message, then matches it against the document's controls.

use crate::document::{ControlMapping, MappingDocument, Resolution};
use deckwire_core::{deck_from_group, MessageClass, MidiMessage};

/// A matched control plus everything derived from the raw message.
#[derive(Debug)]
pub struct Decoded<'a> {
    pub control: &'a ControlMapping,
    /// Normalized value: 7-bit `data[1]/127`, or the reconstructed 14-bit
    /// pair `/16383` for high-resolution controls.
    pub value: f64,
    /// The unnormalized second data byte, as script handlers expect it.
    pub raw_value: u8,
    pub down: bool,
    pub deck: Option<u8>,
}

/// Per-device decoder owning the rolling last-message slot used for 14-bit
/// reconstruction.
///
/// The slot is a single `Option<MidiMessage>` regardless of which control
/// sent the prior message, matching the historical behavior. Known hazard:
/// two distinct high-resolution controls firing back-to-back corrupt each
/// other's reconstruction. A keyed slot would fix this; the single-slot
/// semantics are kept deliberately.
#[derive(Debug, Default)]
pub struct Decoder {
    last_msg: Option<MidiMessage>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode<'a>(
        &mut self,
        msg: &MidiMessage,
        doc: &'a MappingDocument,
    ) -> Option<Decoded<'a>> {
        // The slot updates for every message, matched or not.
        let prior = self.last_msg.replace(msg.clone());

        if msg.class() == MessageClass::Other {
            return None;
        }

        let control = doc.find_control(msg.status, msg.data0())?;
        let raw_value = msg.data1();
        let down = raw_value > 0;
        let value = match control.resolution {
            Resolution::Low => raw_value as f64 / 127.0,
            Resolution::High => {
                let previous = prior.map(|m| m.data1()).unwrap_or(0) as u16;
                let combined = (previous << 7) | raw_value as u16;
                combined as f64 / 16383.0
            }
        };

        Some(Decoded {
            control,
            value,
            raw_value,
            down,
            deck: deck_from_group(&control.group),
        })
    }
}
