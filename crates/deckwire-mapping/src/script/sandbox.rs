//! The script sandbox: one boa context per loaded mapping.

use super::facade::{self, HostState};
use super::timers::TimerWheel;
use crate::document::{ControlMapping, ScriptFile};
use crate::error::{Error, Result};
use boa_engine::{Context, JsObject, JsString, JsValue, Source};
use deckwire_core::{Action, MidiMessage};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, warn};

/// Isolated evaluation context for a mapping's controller scripts.
///
/// Deliberately long-lived: real mapping scripts keep module-level counters
/// and state across invocations. Not `Send`; the owning engine is
/// thread-affine.
pub struct Sandbox {
    context: Context<'static>,
    state: Rc<HostState>,
    /// Loaded namespaces in registration order, keyed by function prefix.
    namespaces: Vec<(String, JsObject)>,
    timers: TimerWheel,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        let mut context = Context::default();
        let state = Rc::new(HostState::default());

        let engine = facade::build_engine(&state, &mut context);
        let script = facade::build_script_helper(&mut context);
        let midi = facade::build_midi_handle(&state, &mut context);

        // Exactly three names are visible to scripts beyond the language
        // itself: engine, script, and the raw midi handle.
        for (name, object) in [("engine", engine), ("script", script), ("midi", midi)] {
            context
                .register_global_property(
                    JsString::from(name),
                    object,
                    boa_engine::property::Attribute::all(),
                )
                .map_err(|e| Error::Init(e.to_string()))?;
        }

        Ok(Self {
            context,
            state,
            namespaces: Vec::new(),
            timers: TimerWheel::new(),
        })
    }

    /// Evaluates one script source and registers its namespace.
    ///
    /// A script that throws during load is fatal to loading this mapping.
    pub fn load(&mut self, source: &str, script_file: &ScriptFile) -> Result<()> {
        self.context
            .eval(Source::from_bytes(source))
            .map_err(|e| Error::ScriptLoad {
                file: script_file.file_name.clone(),
                message: e.to_string(),
            })?;

        if let Some(prefix) = &script_file.function_prefix {
            let global = self.context.global_object();
            let value = global
                .get(JsString::from(prefix.as_str()), &mut self.context)
                .map_err(|e| Error::ScriptLoad {
                    file: script_file.file_name.clone(),
                    message: e.to_string(),
                })?;
            match value.as_object() {
                Some(object) => {
                    debug!(prefix = %prefix, file = %script_file.file_name, "script namespace registered");
                    self.namespaces.push((prefix.clone(), object.clone()));
                }
                None => {
                    return Err(Error::ScriptLoad {
                        file: script_file.file_name.clone(),
                        message: format!("function prefix {prefix:?} is not an object"),
                    })
                }
            }
        }

        // Top-level code may already have registered timers.
        self.timers.absorb(&self.state, Instant::now());
        Ok(())
    }

    /// Invokes `init()` on every namespace that exports one. Must complete
    /// before the first message is decoded.
    pub fn init(&mut self) -> Result<()> {
        for (prefix, namespace) in self.namespaces.clone() {
            let init = namespace
                .get(JsString::from("init"), &mut self.context)
                .map_err(|e| Error::Init(e.to_string()))?;
            if let Some(function) = init.as_callable() {
                function
                    .call(&JsValue::from(namespace.clone()), &[], &mut self.context)
                    .map_err(|e| Error::Init(format!("{prefix}.init: {e}")))?;
            }
        }
        self.timers.absorb(&self.state, Instant::now());
        // init() side effects (e.g. LED resets via midi.sendShortMsg) are
        // legitimate; actions emitted here are discarded by the caller's
        // first drain, so clear deliberately.
        self.state.actions.borrow_mut().clear();
        Ok(())
    }

    /// Looks up and invokes the handler bound to a scripted control, then
    /// drains the shared action buffer.
    ///
    /// The buffer is cleared immediately before the call; a handler that
    /// throws is reported and yields an empty list without poisoning later
    /// messages. An unresolvable function also yields an empty list.
    pub fn dispatch(
        &mut self,
        control: &ControlMapping,
        deck: Option<u8>,
        raw_value: u8,
        status: u8,
    ) -> Vec<Action> {
        let mut segments = control.key.split('.');
        let prefix = segments.next().unwrap_or_default();
        let Some(namespace) = self.lookup_namespace(prefix) else {
            debug!(key = %control.key, "no namespace for script binding");
            return Vec::new();
        };

        let mut target = JsValue::from(namespace.clone());
        for segment in segments {
            let Some(object) = target.as_object().cloned() else {
                return Vec::new();
            };
            match object.get(JsString::from(segment), &mut self.context) {
                Ok(next) => target = next,
                Err(_) => return Vec::new(),
            }
        }
        let Some(function) = target.as_callable().cloned() else {
            debug!(key = %control.key, "script binding is not callable");
            return Vec::new();
        };

        let control_obj = facade::control_to_js(
            &control.group,
            &control.key,
            control.status,
            control.midino,
            &mut self.context,
        );
        // Scripts receive a 0-based deck index; a deck-less group maps to -1
        // (the historical null-coercion result).
        let deck_index = deck.map_or(-1, |d| d as i32 - 1);
        let args = [
            JsValue::from(deck_index),
            JsValue::from(control_obj),
            JsValue::from(raw_value as i32),
            JsValue::from(status as i32),
            JsValue::from(JsString::from(control.group.as_str())),
        ];

        self.state.actions.borrow_mut().clear();
        let this = JsValue::from(namespace);
        if let Err(e) = function.call(&this, &args, &mut self.context) {
            let err = Error::ScriptRuntime {
                handler: control.key.clone(),
                message: e.to_string(),
            };
            warn!(%err, "script dispatch failed; message yields no actions");
            self.state.actions.borrow_mut().clear();
        }
        self.timers.absorb(&self.state, Instant::now());
        self.drain_actions()
    }

    /// Runs every timer callback due at `now`, collecting the actions each
    /// one buffered. Interval timers that throw keep their schedule;
    /// one-shots are already gone.
    pub fn fire_timers(&mut self, now: Instant) -> Vec<Action> {
        self.timers.absorb(&self.state, now);
        let mut actions = Vec::new();
        for (id, callback) in self.timers.take_due(now) {
            let Some(function) = callback.as_callable().cloned() else {
                continue;
            };
            self.state.actions.borrow_mut().clear();
            if let Err(e) = function.call(&JsValue::undefined(), &[], &mut self.context) {
                warn!(timer = id, error = %e, "timer callback failed");
                self.state.actions.borrow_mut().clear();
            }
            self.timers.absorb(&self.state, now);
            actions.extend(self.drain_actions());
        }
        actions
    }

    /// Raw messages queued by `midi.sendShortMsg`, in call order.
    pub fn drain_outgoing(&mut self) -> Vec<MidiMessage> {
        self.state.outgoing.borrow_mut().drain(..).collect()
    }

    pub fn has_namespace(&self, prefix: &str) -> bool {
        self.lookup_namespace(prefix).is_some()
    }

    /// Number of live timers; mainly useful to hosts deciding whether to
    /// keep polling `fire_timers`.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<JsObject> {
        self.namespaces
            .iter()
            .find(|(name, _)| name == prefix)
            .map(|(_, object)| object.clone())
    }

    fn drain_actions(&self) -> Vec<Action> {
        self.state.actions.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn script_file(prefix: &str) -> ScriptFile {
        ScriptFile {
            file_name: format!("{prefix}.js"),
            function_prefix: Some(prefix.to_string()),
        }
    }

    fn scripted_control(key: &str) -> ControlMapping {
        ControlMapping {
            group: "[Channel1]".into(),
            key: key.into(),
            status: 0xB0,
            midino: 0x22,
            options: HashSet::from(["script-binding".to_string()]),
            resolution: crate::document::Resolution::from_midino(0x22),
        }
    }

    #[test]
    fn test_load_and_dispatch_buffers_actions() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.jog = function(deck, control, value, status, group) {
                    engine.setValue(group, "volume", value / 127);
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        assert!(sandbox.has_namespace("Ctl"));

        let actions = sandbox.dispatch(&scripted_control("Ctl.jog"), Some(1), 127, 0xB0, );
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            actions[0],
            Action::Value {
                control: deckwire_core::ValueControl::Volume,
                deck: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_throwing_handler_recovers() {
        init_tracing();
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.bad = function() { throw new Error("boom"); };
                Ctl.good = function(deck, control, value, status, group) {
                    engine.setValue("[Master]", "crossfader", 0.5);
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();

        assert!(sandbox.dispatch(&scripted_control("Ctl.bad"), Some(1), 1, 0xB0).is_empty());
        // Subsequent dispatches are unaffected.
        let actions = sandbox.dispatch(&scripted_control("Ctl.good"), Some(1), 1, 0xB0);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_missing_function_yields_empty() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load("var Ctl = {};", &script_file("Ctl"))
            .unwrap();
        assert!(sandbox
            .dispatch(&scripted_control("Ctl.nope"), Some(1), 1, 0xB0)
            .is_empty());
        assert!(sandbox
            .dispatch(&scripted_control("Other.fn"), Some(1), 1, 0xB0)
            .is_empty());
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let mut sandbox = Sandbox::new().unwrap();
        let err = sandbox
            .load("this is not javascript ~~~", &script_file("Bad"))
            .unwrap_err();
        assert!(matches!(err, Error::ScriptLoad { .. }));
    }

    #[test]
    fn test_unimplemented_engine_method_is_noop() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.poke = function(deck, control, value, status, group) {
                    engine.softTakeover(group, "rate", true);
                    engine.scratchTick(1, 5);
                    engine.setValue(group, "rate", 0.5);
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        let actions = sandbox.dispatch(&scripted_control("Ctl.poke"), Some(1), 1, 0xB0);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_module_state_persists_across_calls() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = { count: 0 };
                Ctl.tick = function(deck, control, value, status, group) {
                    Ctl.count += 1;
                    engine.setValue("[Master]", "crossfader", Ctl.count / 10);
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        sandbox.dispatch(&scripted_control("Ctl.tick"), Some(1), 1, 0xB0);
        let actions = sandbox.dispatch(&scripted_control("Ctl.tick"), Some(1), 1, 0xB0);
        assert!(matches!(
            actions[0],
            Action::Value { value, .. } if (value - 0.2).abs() < 1e-9
        ));
    }

    #[test]
    fn test_init_invoked_with_namespace_this() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = { ready: false };
                Ctl.init = function() { this.ready = true; };
                Ctl.check = function(deck, control, value, status, group) {
                    if (Ctl.ready) { engine.setValue("[Master]", "crossfader", 1); }
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        sandbox.init().unwrap();
        let actions = sandbox.dispatch(&scripted_control("Ctl.check"), None, 1, 0xB0);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_timer_registration_and_firing() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.init = function() {
                    engine.beginTimer(10, function() {
                        engine.setValue("[Master]", "crossfader", 0.75);
                    }, true);
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        sandbox.init().unwrap();
        assert_eq!(sandbox.timer_count(), 1);

        let actions = sandbox.fire_timers(Instant::now() + Duration::from_millis(20));
        assert_eq!(actions.len(), 1);
        // One-shot: gone after firing.
        assert_eq!(sandbox.timer_count(), 0);
    }

    #[test]
    fn test_midi_send_short_msg_buffers_raw_messages() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.init = function() { midi.sendShortMsg(0x90, 0x0B, 0x7F); };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        sandbox.init().unwrap();
        let outgoing = sandbox.drain_outgoing();
        assert_eq!(outgoing, vec![MidiMessage::new(0x90, &[0x0B, 0x7F])]);
    }

    #[test]
    fn test_script_helper_deck_from_group() {
        let mut sandbox = Sandbox::new().unwrap();
        sandbox
            .load(
                r#"
                var Ctl = {};
                Ctl.probe = function(deck, control, value, status, group) {
                    if (script.deckFromGroup("[Channel2]") === 2) {
                        engine.setValue("[Channel2]", "volume", 1);
                    }
                };
                "#,
                &script_file("Ctl"),
            )
            .unwrap();
        let actions = sandbox.dispatch(&scripted_control("Ctl.probe"), Some(1), 1, 0xB0);
        assert_eq!(actions.len(), 1);
    }
}
