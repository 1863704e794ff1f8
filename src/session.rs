//! Per-device controller session.
//!
//! Owns the active mapping and the device transport, queues messages that
//! arrive before a mapping finishes loading, and emits the minimal play-LED
//! feedback toward the device.

use crate::error::Result;
use deckwire_core::{deck_from_group, Action, MidiMessage};
use deckwire_io::MidiTransport;
use deckwire_mapping::ControllerMapping;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{info, warn};

/// One connected device: transport plus the currently active mapping.
///
/// The decode pipeline is single-threaded and synchronous: each fed message
/// is fully decoded, dispatched, and delivered before the next. The session
/// is thread-affine (the script sandbox is not `Send`); hardware input
/// reaches it over a channel.
pub struct ControllerSession {
    mapping: Option<ControllerMapping>,
    transport: Option<Box<dyn MidiTransport>>,
    /// Messages received before the first mapping finished loading. Decoding
    /// against a partially loaded mapping is never allowed.
    pending: VecDeque<MidiMessage>,
}

impl ControllerSession {
    pub fn new() -> Self {
        Self {
            mapping: None,
            transport: None,
            pending: VecDeque::new(),
        }
    }

    pub fn with_transport(transport: Box<dyn MidiTransport>) -> Self {
        Self {
            mapping: None,
            transport: Some(transport),
            pending: VecDeque::new(),
        }
    }

    pub fn set_transport(&mut self, transport: Box<dyn MidiTransport>) {
        self.transport = Some(transport);
    }

    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn mapping(&self) -> Option<&ControllerMapping> {
        self.mapping.as_ref()
    }

    /// Parses and activates a mapping, running scripts and `init()` before
    /// any message is decoded against it.
    ///
    /// The swap is atomic from the pipeline's point of view: on any failure
    /// the previously active mapping stays in place; on success the old
    /// mapping is replaced in one step and messages queued during loading
    /// are drained through the new one. Their actions are returned.
    pub fn load_mapping<F>(&mut self, xml_src: &str, script_loader: F) -> Result<Vec<Action>>
    where
        F: FnMut(&str) -> deckwire_mapping::Result<String>,
    {
        let mut mapping = ControllerMapping::parse(xml_src, script_loader)?;
        mapping.init()?;
        info!(
            name = mapping.info().name.as_deref().unwrap_or("<unnamed>"),
            "mapping activated"
        );

        let mut actions = Vec::new();
        while let Some(msg) = self.pending.pop_front() {
            actions.extend(mapping.handle_incoming(&msg));
        }
        self.mapping = Some(mapping);
        self.flush_outgoing();
        Ok(actions)
    }

    /// Drops the active mapping. Subsequent messages queue until a new one
    /// loads.
    pub fn clear_mapping(&mut self) {
        self.mapping = None;
    }

    /// Feeds one raw message through the pipeline.
    ///
    /// With no active mapping the message is queued and an empty list
    /// returned; otherwise the decoded actions are delivered synchronously.
    pub fn feed(&mut self, msg: MidiMessage) -> Vec<Action> {
        match self.mapping.as_mut() {
            Some(mapping) => {
                let actions = mapping.handle_incoming(&msg);
                self.flush_outgoing();
                actions
            }
            None => {
                self.pending.push_back(msg);
                Vec::new()
            }
        }
    }

    /// Runs script timers due at `now` and forwards any raw messages they
    /// queued.
    pub fn fire_timers(&mut self, now: Instant) -> Vec<Action> {
        let actions = match self.mapping.as_mut() {
            Some(mapping) => mapping.fire_timers(now),
            None => Vec::new(),
        };
        self.flush_outgoing();
        actions
    }

    /// Minimal LED feedback: when a deck's play state changes, send note-on
    /// with velocity 127 (on) or 0 (off) to that deck's mapped play control.
    pub fn set_deck_playing(&mut self, deck: u8, playing: bool) -> Result<()> {
        let Some(mapping) = self.mapping.as_ref() else {
            return Ok(());
        };
        let play = mapping.document().controls.iter().find(|c| {
            c.key == "play"
                && deck_from_group(&c.group) == Some(deck)
                && matches!(c.status & 0xF0, 0x80 | 0x90)
        });
        let Some(control) = play else {
            return Ok(());
        };

        let status = 0x90 | (control.status & 0x0F);
        let velocity = if playing { 0x7F } else { 0x00 };
        if let Some(transport) = self.transport.as_mut() {
            transport.send(&[status, control.midino, velocity])?;
        }
        Ok(())
    }

    /// Forwards raw messages scripts queued via `midi.sendShortMsg`.
    fn flush_outgoing(&mut self) {
        let Some(mapping) = self.mapping.as_mut() else {
            return;
        };
        let outgoing = mapping.outgoing_messages();
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        for msg in outgoing {
            let mut bytes = vec![msg.status];
            bytes.extend_from_slice(&msg.data);
            if let Err(e) = transport.send(&bytes) {
                warn!(error = %e, "dropping outgoing script message");
            }
        }
    }
}

impl Default for ControllerSession {
    fn default() -> Self {
        Self::new()
    }
}
