//! Host facade objects injected into the script context.
//!
//! Every facade method routes through the [`FacadeOp`] union: an exhaustive
//! list of the operations this engine models plus an explicit `Ignored` arm
//! covering the rest of the scripting API surface. An unmodeled call is a
//! harmless no-op, never a dispatch failure.

use super::timers::TimerRequest;
use crate::resolver;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    js_string, Context, JsArgs, JsObject, JsResult, JsString, JsValue, NativeFunction,
};
use boa_gc::{Finalize, Trace};
use deckwire_core::{deck_from_group, Action, MidiMessage};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Scripting-API method names the engine accepts but does not model.
/// Registered so that calling them is a silent no-op.
const IGNORED_ENGINE_METHODS: &[&str] = &[
    "getValue",
    "getParameter",
    "getParameterForValue",
    "getDefaultValue",
    "reset",
    "trigger",
    "connectControl",
    "makeConnection",
    "softTakeover",
    "softTakeoverIgnoreNextValue",
    "scratchEnable",
    "scratchTick",
    "scratchDisable",
    "isScratching",
    "brake",
    "spinback",
    "softStart",
    "log",
];

/// One facade operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FacadeOp {
    SetValue,
    SetParameter,
    BeginTimer,
    StopTimer,
    SendShortMsg,
    Ignored,
}

/// Mutable state shared between the facade objects and the dispatcher.
///
/// Scripts can only write here; the dispatcher clears the action buffer
/// before every invocation and drains it right after, so no call ever sees
/// another call's output.
#[derive(Default)]
pub(crate) struct HostState {
    /// Ordered action buffer populated by `engine.setValue`/`setParameter`.
    pub actions: RefCell<Vec<Action>>,
    /// Raw outgoing messages from `midi.sendShortMsg`.
    pub outgoing: RefCell<Vec<MidiMessage>>,
    pub timer_requests: RefCell<Vec<TimerRequest>>,
    pub stopped_timers: RefCell<Vec<u32>>,
    next_timer_id: Cell<u32>,
}

impl HostState {
    fn register_timer(&self, interval_ms: f64, callback: JsValue, one_shot: bool) -> u32 {
        let id = self.next_timer_id.get() + 1;
        self.next_timer_id.set(id);
        let interval = if interval_ms.is_finite() && interval_ms > 0.0 {
            Duration::from_secs_f64(interval_ms / 1000.0)
        } else {
            Duration::ZERO
        };
        self.timer_requests.borrow_mut().push(TimerRequest {
            id,
            interval,
            one_shot,
            callback,
        });
        id
    }
}

#[derive(Trace, Finalize)]
struct FacadeCaptures {
    #[unsafe_ignore_trace]
    op: FacadeOp,
    #[unsafe_ignore_trace]
    state: Rc<HostState>,
}

fn facade_fn(op: FacadeOp, state: &Rc<HostState>) -> NativeFunction {
    NativeFunction::from_copy_closure_with_captures(
        |_this, args, captures, ctx| facade_call(captures, args, ctx),
        FacadeCaptures {
            op,
            state: Rc::clone(state),
        },
    )
}

fn facade_call(
    captures: &FacadeCaptures,
    args: &[JsValue],
    ctx: &mut Context<'_>,
) -> JsResult<JsValue> {
    match captures.op {
        FacadeOp::SetValue | FacadeOp::SetParameter => {
            let group = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
            let key = args.get_or_undefined(1).to_string(ctx)?.to_std_string_escaped();
            let value = args.get_or_undefined(2).to_number(ctx)?;
            if let Some(action) = resolver::value_action(&group, &key, value) {
                captures.state.actions.borrow_mut().push(action);
            } else {
                tracing::trace!(%group, %key, "engine.setValue for unmodeled key ignored");
            }
            Ok(JsValue::undefined())
        }
        FacadeOp::BeginTimer => {
            let interval_ms = args.get_or_undefined(0).to_number(ctx)?;
            let callback = args.get_or_undefined(1).clone();
            let one_shot = args.get_or_undefined(2).to_boolean();
            let id = captures.state.register_timer(interval_ms, callback, one_shot);
            Ok(JsValue::from(id))
        }
        FacadeOp::StopTimer => {
            let id = args.get_or_undefined(0).to_number(ctx)? as u32;
            captures.state.stopped_timers.borrow_mut().push(id);
            Ok(JsValue::undefined())
        }
        FacadeOp::SendShortMsg => {
            let status = args.get_or_undefined(0).to_number(ctx)? as u8;
            let byte1 = args.get_or_undefined(1).to_number(ctx)? as u8;
            let byte2 = args.get_or_undefined(2).to_number(ctx)? as u8;
            captures
                .state
                .outgoing
                .borrow_mut()
                .push(MidiMessage::new(status, &[byte1, byte2]));
            Ok(JsValue::undefined())
        }
        FacadeOp::Ignored => Ok(JsValue::undefined()),
    }
}

/// Builds the `engine` facade object.
pub(crate) fn build_engine(state: &Rc<HostState>, ctx: &mut Context<'_>) -> JsObject {
    let mut init = ObjectInitializer::new(ctx);
    init.function(facade_fn(FacadeOp::SetValue, state), js_string!("setValue"), 3);
    init.function(
        facade_fn(FacadeOp::SetParameter, state),
        js_string!("setParameter"),
        3,
    );
    init.function(
        facade_fn(FacadeOp::BeginTimer, state),
        js_string!("beginTimer"),
        3,
    );
    init.function(facade_fn(FacadeOp::StopTimer, state), js_string!("stopTimer"), 1);
    for name in IGNORED_ENGINE_METHODS {
        init.function(facade_fn(FacadeOp::Ignored, state), JsString::from(*name), 0);
    }
    init.build()
}

/// Builds the `script` helper object: one pure function.
pub(crate) fn build_script_helper(ctx: &mut Context<'_>) -> JsObject {
    ObjectInitializer::new(ctx)
        .function(
            NativeFunction::from_fn_ptr(script_deck_from_group),
            js_string!("deckFromGroup"),
            1,
        )
        .build()
}

fn script_deck_from_group(
    _this: &JsValue,
    args: &[JsValue],
    ctx: &mut Context<'_>,
) -> JsResult<JsValue> {
    let group = args.get_or_undefined(0).to_string(ctx)?.to_std_string_escaped();
    Ok(match deck_from_group(&group) {
        Some(deck) => JsValue::from(deck as i32),
        None => JsValue::null(),
    })
}

/// Builds the raw `midi` transport handle: low-level sends pass through
/// unchanged (buffered; the host drains and forwards them).
pub(crate) fn build_midi_handle(state: &Rc<HostState>, ctx: &mut Context<'_>) -> JsObject {
    let mut init = ObjectInitializer::new(ctx);
    init.function(
        facade_fn(FacadeOp::SendShortMsg, state),
        js_string!("sendShortMsg"),
        3,
    );
    init.function(
        facade_fn(FacadeOp::Ignored, state),
        js_string!("sendSysexMsg"),
        2,
    );
    init.build()
}

/// Builds a JS view of a matched control for handler invocation.
pub(crate) fn control_to_js(
    group: &str,
    key: &str,
    status: u8,
    midino: u8,
    ctx: &mut Context<'_>,
) -> JsObject {
    ObjectInitializer::new(ctx)
        .property(js_string!("group"), JsString::from(group), Attribute::all())
        .property(js_string!("key"), JsString::from(key), Attribute::all())
        .property(js_string!("status"), status as i32, Attribute::all())
        .property(js_string!("midino"), midino as i32, Attribute::all())
        .build()
}
