//! Raw MIDI controller messages.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Status-byte class, taken from the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageClass {
    /// 0x80
    NoteOff,
    /// 0x90
    NoteOn,
    /// 0xB0
    ControlChange,
    /// Anything else (pitch bend, sysex, clock, ...). Ignored by the decoder.
    Other,
}

/// A MIDI controller message: status byte plus data bytes (usually one or two).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub status: u8,
    pub data: SmallVec<[u8; 2]>,
}

impl MidiMessage {
    pub fn new(status: u8, data: &[u8]) -> Self {
        Self {
            status,
            data: SmallVec::from_slice(data),
        }
    }

    /// 1-based channel number extracted from the low nibble.
    #[inline]
    pub fn channel(&self) -> u8 {
        (self.status & 0x0F) + 1
    }

    #[inline]
    pub fn class(&self) -> MessageClass {
        match self.status & 0xF0 {
            0x80 => MessageClass::NoteOff,
            0x90 => MessageClass::NoteOn,
            0xB0 => MessageClass::ControlChange,
            _ => MessageClass::Other,
        }
    }

    /// First data byte (note number or CC number), 0 if absent.
    #[inline]
    pub fn data0(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    /// Second data byte (velocity or CC value), 0 if absent.
    #[inline]
    pub fn data1(&self) -> u8 {
        self.data.get(1).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_is_one_based() {
        assert_eq!(MidiMessage::new(0x90, &[11, 127]).channel(), 1);
        assert_eq!(MidiMessage::new(0x91, &[11, 127]).channel(), 2);
        assert_eq!(MidiMessage::new(0xB6, &[31, 64]).channel(), 7);
    }

    #[test]
    fn test_class_from_high_nibble() {
        assert_eq!(MidiMessage::new(0x80, &[11, 0]).class(), MessageClass::NoteOff);
        assert_eq!(MidiMessage::new(0x95, &[11, 1]).class(), MessageClass::NoteOn);
        assert_eq!(
            MidiMessage::new(0xB0, &[33, 64]).class(),
            MessageClass::ControlChange
        );
        assert_eq!(MidiMessage::new(0xE0, &[0, 64]).class(), MessageClass::Other);
        assert_eq!(MidiMessage::new(0xF8, &[]).class(), MessageClass::Other);
    }

    #[test]
    fn test_data_accessors_tolerate_short_messages() {
        let msg = MidiMessage::new(0x90, &[]);
        assert_eq!(msg.data0(), 0);
        assert_eq!(msg.data1(), 0);

        let msg = MidiMessage::new(0x90, &[42]);
        assert_eq!(msg.data0(), 42);
        assert_eq!(msg.data1(), 0);
    }
}
