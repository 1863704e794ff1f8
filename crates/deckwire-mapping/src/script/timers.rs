//! Host-driven timer wheel for script-registered timers.
//!
//! Scripts call `engine.beginTimer(ms, fn, oneShot)`; registrations collect
//! in the shared host state and the wheel schedules them against the host's
//! own clock. Nothing fires until the host calls `fire_timers`.

use super::facade::HostState;
use boa_engine::JsValue;
use std::time::{Duration, Instant};

/// A pending registration picked up from the shared host state.
pub(crate) struct TimerRequest {
    pub id: u32,
    pub interval: Duration,
    pub one_shot: bool,
    pub callback: JsValue,
}

struct TimerEntry {
    id: u32,
    deadline: Instant,
    interval: Duration,
    one_shot: bool,
    callback: JsValue,
}

#[derive(Default)]
pub(crate) struct TimerWheel {
    entries: Vec<TimerEntry>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves new registrations and stop requests out of the shared state.
    pub fn absorb(&mut self, state: &HostState, now: Instant) {
        for req in state.timer_requests.borrow_mut().drain(..) {
            self.entries.push(TimerEntry {
                id: req.id,
                deadline: now + req.interval,
                interval: req.interval,
                one_shot: req.one_shot,
                callback: req.callback,
            });
        }
        for id in state.stopped_timers.borrow_mut().drain(..) {
            self.entries.retain(|e| e.id != id);
        }
    }

    /// Returns every due callback, rescheduling interval timers and removing
    /// one-shots.
    pub fn take_due(&mut self, now: Instant) -> Vec<(u32, JsValue)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].deadline <= now {
                let entry = &mut self.entries[i];
                due.push((entry.id, entry.callback.clone()));
                if entry.one_shot {
                    self.entries.remove(i);
                    continue;
                }
                entry.deadline = now + entry.interval;
            }
            i += 1;
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
