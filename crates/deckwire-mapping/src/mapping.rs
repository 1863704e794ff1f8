//! Top-level decode pipeline for one loaded controller mapping.

use crate::decoder::Decoder;
use crate::document::{MappingDocument, MappingInfo};
use crate::error::Result;
use crate::parser;
use crate::script::Sandbox;
use crate::resolver;
use deckwire_core::{Action, MidiMessage};
use std::time::Instant;
use tracing::debug;

/// A DJ controller mapping: parsed document plus its script sandbox and
/// decoder state.
///
/// Long-lived for the duration of a device session; controller scripts keep
/// internal state, so replacing a mapping means replacing this whole object.
/// Processing is synchronous per message: decode, resolve or dispatch,
/// deliver, then the next message.
pub struct ControllerMapping {
    document: MappingDocument,
    sandbox: Sandbox,
    decoder: Decoder,
}

impl ControllerMapping {
    /// Parses a Mixxx mapping document and loads every referenced script
    /// through `script_loader` (file name -> source).
    ///
    /// Any parse or script evaluation failure aborts the load; the caller's
    /// previously active mapping, if any, is untouched.
    pub fn parse<F>(xml_src: &str, mut script_loader: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let document = parser::parse(xml_src)?;
        let mut sandbox = Sandbox::new()?;
        for script_file in &document.script_files {
            let source = script_loader(&script_file.file_name)?;
            sandbox.load(&source, script_file)?;
        }
        debug!(
            name = document.info.name.as_deref().unwrap_or("<unnamed>"),
            controls = document.controls.len(),
            scripts = document.script_files.len(),
            "mapping loaded"
        );
        Ok(Self {
            document,
            sandbox,
            decoder: Decoder::new(),
        })
    }

    /// Invokes each script namespace's `init()`. Must run before the first
    /// message is decoded.
    pub fn init(&mut self) -> Result<()> {
        self.sandbox.init()
    }

    pub fn info(&self) -> &MappingInfo {
        &self.document.info
    }

    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    /// Determines the actions for one incoming message. Not pure: updates
    /// the rolling last-message slot and may run script code.
    ///
    /// Always terminates in either an empty list or one-or-more actions;
    /// decode misses and unknown keys are not errors.
    pub fn handle_incoming(&mut self, msg: &MidiMessage) -> Vec<Action> {
        let Some(decoded) = self.decoder.decode(msg, &self.document) else {
            return Vec::new();
        };

        if decoded.control.is_script_binding() {
            self.sandbox
                .dispatch(decoded.control, decoded.deck, decoded.raw_value, msg.status)
        } else {
            let control = decoded.control;
            resolver::press_action(&control.group, &control.key, decoded.down)
                .or_else(|| resolver::value_action(&control.group, &control.key, decoded.value))
                .into_iter()
                .collect()
        }
    }

    /// Runs script timers due at `now` on the host's clock.
    pub fn fire_timers(&mut self, now: Instant) -> Vec<Action> {
        self.sandbox.fire_timers(now)
    }

    /// Raw device-bound messages queued by scripts since the last drain.
    pub fn outgoing_messages(&mut self) -> Vec<MidiMessage> {
        self.sandbox.drain_outgoing()
    }
}
