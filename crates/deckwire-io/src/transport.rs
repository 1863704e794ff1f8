//! The device-facing transport seam.
//!
//! The engine depends only on this contract; whether bytes travel over USB,
//! a virtual port, or a test loopback is the host's business.

use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Opaque send side of a device connection.
pub trait MidiTransport: Send {
    /// Sends one raw MIDI message to the device.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// In-memory transport that records every sent frame. Test double and
/// headless stand-in.
#[derive(Default, Clone)]
pub struct LoopbackTransport {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }
}

impl MidiTransport for LoopbackTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.frames.lock().push(bytes.to_vec());
        Ok(())
    }
}
