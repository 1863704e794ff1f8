//! Deck addressing from mapping group strings.

use once_cell::sync::Lazy;
use regex::Regex;

static CHANNEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Channel(\d+)\]").expect("channel pattern"));

/// Extracts the deck number from a group string like `"[Channel1]"`.
///
/// Groups without a channel address (`"[Master]"`, equalizer racks keyed by
/// name only) yield `None`; actions for such controls are still valid.
pub fn deck_from_group(group: &str) -> Option<u8> {
    CHANNEL_RE
        .captures(group)
        .and_then(|caps| caps[1].parse().ok())
}
