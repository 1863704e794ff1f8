//! Hardware MIDI output.

use crate::error::{Error, Result};
use crate::transport::MidiTransport;
use midir::{MidiOutput, MidiOutputConnection};
use tracing::debug;

/// An open hardware output port. Implements [`MidiTransport`], so the
/// session can drive LED feedback through it directly.
pub struct MidiOutputDevice {
    name: String,
    connection: MidiOutputConnection,
}

impl MidiOutputDevice {
    /// Lists the names of all available output ports.
    pub fn list_ports() -> Result<Vec<String>> {
        let output = client()?;
        output
            .ports()
            .iter()
            .map(|p| output.port_name(p).map_err(Error::from))
            .collect()
    }

    /// Connects to the first output port whose name contains `name_fragment`
    /// (case-insensitive).
    pub fn connect(name_fragment: &str) -> Result<Self> {
        let output = client()?;
        let needle = name_fragment.to_lowercase();
        let mut selected = None;
        for port in output.ports() {
            let name = output.port_name(&port)?;
            if name.to_lowercase().contains(&needle) {
                selected = Some((port, name));
                break;
            }
        }
        let (port, name) = selected.ok_or_else(|| {
            Error::MidiDevice(format!("no output port matching {name_fragment:?}"))
        })?;

        let connection = output.connect(&port, "deckwire-out")?;
        debug!(port = %name, "MIDI output connected");
        Ok(Self { name, connection })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl MidiTransport for MidiOutputDevice {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection.send(bytes).map_err(Error::from)
    }
}

fn client() -> Result<MidiOutput> {
    MidiOutput::new("deckwire").map_err(Error::from)
}
