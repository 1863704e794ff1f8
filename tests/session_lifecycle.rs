//! Session behavior: mapping activation, pre-load queueing, LED feedback,
//! and manifest-driven mapping selection.

use deckwire::{
    Action, ControllerSession, LoopbackTransport, Manifest, MidiMessage, PressControl,
};

const XML: &str = r#"<MixxxControllerPreset>
  <info><name>Session deck</name></info>
  <controller id="session">
    <controls>
      <control>
        <group>[Channel1]</group><key>play</key>
        <status>0x90</status><midino>0x0B</midino>
      </control>
      <control>
        <group>[Channel2]</group><key>play</key>
        <status>0x91</status><midino>0x0B</midino>
      </control>
      <control>
        <group>[Channel1]</group><key>volume</key>
        <status>0xB0</status><midino>19</midino>
      </control>
    </controls>
  </controller>
</MixxxControllerPreset>"#;

fn no_scripts(_name: &str) -> deckwire_mapping::Result<String> {
    Ok(String::new())
}

#[test]
fn messages_before_load_are_queued_then_replayed() {
    let mut session = ControllerSession::new();
    assert!(session.feed(MidiMessage::new(0x90, &[0x0B, 127])).is_empty());
    assert!(session.feed(MidiMessage::new(0xB0, &[19, 64])).is_empty());

    let replayed = session.load_mapping(XML, no_scripts).unwrap();
    assert_eq!(replayed.len(), 2);
    assert!(matches!(
        replayed[0],
        Action::Press {
            control: PressControl::Play,
            deck: Some(1),
            down: true,
        }
    ));
}

#[test]
fn failed_load_keeps_previous_mapping() {
    let mut session = ControllerSession::new();
    session.load_mapping(XML, no_scripts).unwrap();

    let broken = "<p><controller><controls>\
                  <control><group>[Channel1]</group></control>\
                  </controls></controller></p>";
    assert!(session.load_mapping(broken, no_scripts).is_err());

    // The first mapping is still live.
    assert!(session.has_mapping());
    assert_eq!(session.feed(MidiMessage::new(0x90, &[0x0B, 127])).len(), 1);
}

#[test]
fn clear_mapping_resumes_queueing() {
    let mut session = ControllerSession::new();
    session.load_mapping(XML, no_scripts).unwrap();
    session.clear_mapping();

    assert!(session.feed(MidiMessage::new(0x90, &[0x0B, 127])).is_empty());
    let replayed = session.load_mapping(XML, no_scripts).unwrap();
    assert_eq!(replayed.len(), 1);
}

#[test]
fn play_led_follows_deck_state() {
    let loopback = LoopbackTransport::new();
    let mut session = ControllerSession::with_transport(Box::new(loopback.clone()));
    session.load_mapping(XML, no_scripts).unwrap();

    session.set_deck_playing(1, true).unwrap();
    session.set_deck_playing(2, true).unwrap();
    session.set_deck_playing(1, false).unwrap();
    assert_eq!(
        loopback.sent(),
        vec![
            vec![0x90, 0x0B, 0x7F],
            vec![0x91, 0x0B, 0x7F],
            vec![0x90, 0x0B, 0x00],
        ]
    );

    // A deck with no mapped play control sends nothing.
    loopback.clear();
    session.set_deck_playing(3, true).unwrap();
    assert!(loopback.sent().is_empty());
}

#[test]
fn led_feedback_without_transport_is_a_noop() {
    let mut session = ControllerSession::new();
    session.load_mapping(XML, no_scripts).unwrap();
    session.set_deck_playing(1, true).unwrap();
}

#[test]
fn script_outgoing_frames_reach_the_transport() {
    let xml = r#"<MixxxControllerPreset>
      <controller id="led">
        <scriptfiles><file filename="led.js" functionprefix="Led"/></scriptfiles>
        <controls>
          <control>
            <group>[Channel1]</group><key>Led.press</key>
            <status>0x90</status><midino>0x10</midino>
            <options><script-binding/></options>
          </control>
        </controls>
      </controller>
    </MixxxControllerPreset>"#;
    let script = r#"
        var Led = {};
        Led.press = function(deck, control, value, status, group) {
            midi.sendShortMsg(0x90, 0x10, value > 0 ? 0x7F : 0x00);
        };
    "#;

    let loopback = LoopbackTransport::new();
    let mut session = ControllerSession::with_transport(Box::new(loopback.clone()));
    session.load_mapping(xml, |_| Ok(script.to_string())).unwrap();

    session.feed(MidiMessage::new(0x90, &[0x10, 127]));
    session.feed(MidiMessage::new(0x90, &[0x10, 0]));
    assert_eq!(
        loopback.sent(),
        vec![vec![0x90, 0x10, 0x7F], vec![0x90, 0x10, 0x00]]
    );
}

#[test]
fn manifest_detects_exactly_one_mapping() {
    let manifest = Manifest::from_json(
        r#"[
            {"name": "DDJ-400", "filename": "Pioneer-DDJ-400.midi.xml", "id": "ddj-400"},
            {"name": "Pioneer DDJ", "filename": "Pioneer-DDJ-generic.midi.xml", "id": "ddj"},
            {"name": "Mixtrack", "filename": "Numark-Mixtrack.midi.xml", "id": "mixtrack"}
        ]"#,
    )
    .unwrap();

    // Case-insensitive by id.
    let entry = manifest.detect("numark MIXTRACK MIDI 1").unwrap();
    assert_eq!(entry.id, "mixtrack");

    // "Pioneer DDJ-400" matches both the specific and the generic entry;
    // ambiguity means no auto-load.
    assert!(manifest.detect("Pioneer DDJ-400 MIDI 1").is_none());
    assert!(manifest.detect("Launchpad Mini").is_none());
}
