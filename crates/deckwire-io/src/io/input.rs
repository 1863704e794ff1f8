//! Hardware MIDI input.
//!
//! The midir callback runs on a backend thread; parsed messages cross into
//! the engine's thread over a channel, keeping the decode pipeline
//! single-threaded.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender};
use deckwire_core::MidiMessage;
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{debug, trace};

/// An open hardware input port delivering [`MidiMessage`]s.
pub struct MidiInputDevice {
    name: String,
    receiver: Receiver<MidiMessage>,
    // Held for the connection's lifetime; dropping closes the port.
    _connection: MidiInputConnection<Sender<MidiMessage>>,
}

impl MidiInputDevice {
    /// Lists the names of all available input ports.
    pub fn list_ports() -> Result<Vec<String>> {
        let input = client()?;
        input
            .ports()
            .iter()
            .map(|p| input.port_name(p).map_err(Error::from))
            .collect()
    }

    /// Connects to the first input port whose name contains `name_fragment`
    /// (case-insensitive).
    pub fn connect(name_fragment: &str) -> Result<Self> {
        let mut input = client()?;
        input.ignore(Ignore::None);

        let needle = name_fragment.to_lowercase();
        let mut selected = None;
        for port in input.ports() {
            let name = input.port_name(&port)?;
            if name.to_lowercase().contains(&needle) {
                selected = Some((port, name));
                break;
            }
        }
        let (port, name) = selected
            .ok_or_else(|| Error::MidiDevice(format!("no input port matching {name_fragment:?}")))?;

        let (sender, receiver) = crossbeam_channel::unbounded();
        let connection = input.connect(
            &port,
            "deckwire-in",
            |_timestamp, bytes, sender| {
                if let Some((status, data)) = bytes.split_first() {
                    trace!(status = *status, len = data.len(), "midi in");
                    // Receiver gone means the device handle was dropped.
                    let _ = sender.send(MidiMessage::new(*status, data));
                }
            },
            sender,
        )?;
        debug!(port = %name, "MIDI input connected");

        Ok(Self {
            name,
            receiver,
            _connection: connection,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel end the engine thread drains.
    pub fn receiver(&self) -> &Receiver<MidiMessage> {
        &self.receiver
    }

    /// Non-blocking poll for the next message.
    pub fn try_recv(&self) -> Option<MidiMessage> {
        self.receiver.try_recv().ok()
    }
}

fn client() -> Result<MidiInput> {
    MidiInput::new("deckwire").map_err(Error::from)
}
