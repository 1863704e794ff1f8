//! Static key -> action lookup tables.
//!
//! Maps a logical control key plus a decoded value onto a semantic [`Action`].
//! Unknown keys yield `None`, never an error: a mapping may legitimately
//! reference controls this engine does not model.

use deckwire_core::{deck_from_group, Action, PressControl, ValueControl};
use once_cell::sync::Lazy;
use regex::Regex;

static BEATLOOP_TOGGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^beatloop_(\d+)_toggle$").expect("beatloop pattern"));

/// Resolves a button-like key to a press action.
pub fn press_action(group: &str, key: &str, down: bool) -> Option<Action> {
    let control = match key {
        "play" => Some(PressControl::Play),
        "cue_default" => Some(PressControl::Cue),
        "start_stop" => Some(PressControl::StopAtStart),
        "loop_halve" => Some(PressControl::LoopResize { factor: 0.5 }),
        "loop_double" => Some(PressControl::LoopResize { factor: 2.0 }),
        "beatloop_activate" => Some(PressControl::LoopToggle { beats: None }),
        "sync_enabled" => Some(PressControl::Sync),
        _ => BEATLOOP_TOGGLE_RE
            .captures(key)
            .and_then(|caps| caps[1].parse().ok())
            .map(|beats| PressControl::LoopToggle { beats: Some(beats) }),
    }?;
    Some(Action::Press {
        control,
        deck: deck_from_group(group),
        down,
    })
}

/// Resolves a continuous key to a value action.
///
/// When the group addresses an equalizer rack, `parameter1..3` override any
/// base mapping and address the EQ bands.
pub fn value_action(group: &str, key: &str, value: f64) -> Option<Action> {
    let mut control = match key {
        "volume" => Some(ValueControl::Volume),
        "pregain" => Some(ValueControl::Gain),
        "crossfader" => Some(ValueControl::Crossfader),
        "rate" => Some(ValueControl::Rate),
        "jog" => Some(ValueControl::Jog),
        _ => None,
    };

    if group.contains("EqualizerRack") {
        control = match key {
            "parameter1" => Some(ValueControl::Lows),
            "parameter2" => Some(ValueControl::Mids),
            "parameter3" => Some(ValueControl::Highs),
            _ => control,
        };
    }

    Some(Action::Value {
        control: control?,
        deck: deck_from_group(group),
        value,
    })
}
