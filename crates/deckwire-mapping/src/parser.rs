//! Mapping document parser for the Mixxx XML controller format.
//!
//! Lenient about missing sections (`<info>`, `<scriptfiles>`, `<controls>`,
//! `<outputs>` default to empty), strict about structure and about the four
//! required scalar fields of each `<control>`.

use crate::document::{
    ControlMapping, MappingDocument, MappingInfo, OutputMapping, Resolution, ScriptFile,
};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;

/// Parses a Mixxx controller mapping document.
pub fn parse(src: &str) -> Result<MappingDocument> {
    let mut reader = Reader::from_str(src);
    reader.config_mut().trim_text(true);

    let mut doc = MappingDocument::default();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                saw_root = true;
                match e.local_name().as_ref() {
                    b"info" => doc.info = parse_info(&mut reader)?,
                    b"scriptfiles" => doc.script_files = parse_script_files(&mut reader)?,
                    b"controls" => doc.controls = parse_controls(&mut reader)?,
                    b"outputs" => doc.outputs = parse_outputs(&mut reader)?,
                    // Descend through container elements (the preset root,
                    // <controller>); everything else is uninterpreted.
                    _ => {}
                }
            }
            Event::Empty(_) => saw_root = true,
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::MalformedDocument("missing document root".into()));
    }
    Ok(doc)
}

fn parse_info(reader: &mut Reader<&[u8]>) -> Result<MappingInfo> {
    let mut info = MappingInfo::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                let text = reader.read_text(e.name())?.into_owned();
                match name.as_slice() {
                    b"name" => info.name = Some(text),
                    b"author" => info.author = Some(text),
                    b"description" => info.description = Some(text),
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"info" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(info)
}

fn parse_script_files(reader: &mut Reader<&[u8]>) -> Result<Vec<ScriptFile>> {
    let mut files = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.local_name().as_ref() == b"file" => {
                files.push(script_file_from_attrs(&e)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"file" => {
                let file = script_file_from_attrs(&e)?;
                reader.read_to_end(e.name())?;
                files.push(file);
            }
            Event::End(e) if e.local_name().as_ref() == b"scriptfiles" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(files)
}

fn script_file_from_attrs(e: &BytesStart<'_>) -> Result<ScriptFile> {
    let mut file_name = None;
    let mut function_prefix = None;
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        let val = String::from_utf8_lossy(&attr.value).to_string();
        match key.as_str() {
            "filename" => file_name = Some(val),
            "functionprefix" => function_prefix = Some(val),
            _ => {}
        }
    }
    let file_name = file_name
        .ok_or_else(|| Error::MalformedDocument("<file> missing filename attribute".into()))?;
    Ok(ScriptFile {
        file_name,
        function_prefix: function_prefix.filter(|p| !p.is_empty()),
    })
}

/// Shared scalar fields of `<control>` and `<output>` elements.
#[derive(Default)]
struct BaseFields {
    group: Option<String>,
    key: Option<String>,
    status: Option<u8>,
    midino: Option<u8>,
}

impl BaseFields {
    fn require(self, element: &str) -> Result<(String, String, u8, u8)> {
        let missing = |field: &str| {
            Error::MalformedDocument(format!("<{element}> missing <{field}>"))
        };
        Ok((
            self.group.ok_or_else(|| missing("group"))?,
            self.key.ok_or_else(|| missing("key"))?,
            self.status.ok_or_else(|| missing("status"))?,
            self.midino.ok_or_else(|| missing("midino"))?,
        ))
    }
}

fn parse_controls(reader: &mut Reader<&[u8]>) -> Result<Vec<ControlMapping>> {
    let mut controls = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"control" => {
                controls.push(parse_control(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"controls" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(controls)
}

fn parse_control(reader: &mut Reader<&[u8]>) -> Result<ControlMapping> {
    let mut base = BaseFields::default();
    let mut options = HashSet::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"options" => options = parse_options(reader)?,
                    _ => read_base_field(reader, &e, &name, &mut base)?,
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"control" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    let (group, key, status, midino) = base.require("control")?;
    Ok(ControlMapping {
        group,
        key,
        status,
        midino,
        options,
        resolution: Resolution::from_midino(midino),
    })
}

/// The set of child-element names under `<options>`, lowercased.
fn parse_options(reader: &mut Reader<&[u8]>) -> Result<HashSet<String>> {
    let mut options = HashSet::new();
    loop {
        match reader.read_event()? {
            Event::Empty(e) => {
                options.insert(String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase());
            }
            Event::Start(e) => {
                options.insert(String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase());
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"options" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(options)
}

fn parse_outputs(reader: &mut Reader<&[u8]>) -> Result<Vec<OutputMapping>> {
    let mut outputs = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"output" => {
                outputs.push(parse_output(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"outputs" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(outputs)
}

fn parse_output(reader: &mut Reader<&[u8]>) -> Result<OutputMapping> {
    let mut base = BaseFields::default();
    let mut minimum = None;
    let mut maximum = None;
    let mut on = None;
    let mut off = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"minimum" => {
                        minimum = Some(parse_float(&reader.read_text(e.name())?, "minimum")?)
                    }
                    b"maximum" => {
                        maximum = Some(parse_float(&reader.read_text(e.name())?, "maximum")?)
                    }
                    b"on" => on = Some(parse_midi_number(&reader.read_text(e.name())?, "on")?),
                    b"off" => off = Some(parse_midi_number(&reader.read_text(e.name())?, "off")?),
                    _ => read_base_field(reader, &e, &name, &mut base)?,
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"output" => break,
            Event::Eof => break,
            _ => {}
        }
    }
    let (group, key, status, midino) = base.require("output")?;
    Ok(OutputMapping {
        group,
        key,
        status,
        midino,
        minimum,
        maximum,
        on,
        off,
    })
}

fn read_base_field(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    name: &[u8],
    base: &mut BaseFields,
) -> Result<()> {
    match name {
        b"group" => base.group = Some(reader.read_text(e.name())?.into_owned()),
        b"key" => base.key = Some(reader.read_text(e.name())?.into_owned()),
        b"status" => {
            base.status = Some(parse_midi_number(&reader.read_text(e.name())?, "status")?)
        }
        b"midino" => {
            base.midino = Some(parse_midi_number(&reader.read_text(e.name())?, "midino")?)
        }
        // Unmodeled child (e.g. <description>); skip its subtree.
        _ => {
            reader.read_to_end(e.name())?;
        }
    }
    Ok(())
}

/// Mixxx documents write status/midino bytes as decimal or `0x`-prefixed hex.
fn parse_midi_number(text: &str, field: &str) -> Result<u8> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| Error::MalformedDocument(format!("invalid <{field}> value {text:?}")))
}

fn parse_float(text: &str, field: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| Error::MalformedDocument(format!("invalid <{field}> value {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<MixxxControllerPreset mixxxVersion="2.0.0" schemaVersion="1">
  <info>
    <name>Test Controller</name>
    <author>deckwire</author>
    <description>Fixture mapping</description>
  </info>
  <controller id="Test">
    <scriptfiles>
      <file filename="test-controller.js" functionprefix="TestController"/>
    </scriptfiles>
    <controls>
      <control>
        <group>[Channel1]</group>
        <key>play</key>
        <status>0x90</status>
        <midino>0x0B</midino>
        <options>
          <normal/>
        </options>
      </control>
      <control>
        <group>[Channel1]</group>
        <key>rate</key>
        <status>0xB0</status>
        <midino>33</midino>
        <options/>
      </control>
      <control>
        <group>[Channel1]</group>
        <key>TestController.jogWheel</key>
        <status>0xB0</status>
        <midino>0x22</midino>
        <options>
          <Script-Binding/>
        </options>
      </control>
    </controls>
    <outputs>
      <output>
        <group>[Channel1]</group>
        <key>play_indicator</key>
        <status>0x90</status>
        <midino>0x0B</midino>
        <minimum>0.5</minimum>
        <on>0x7F</on>
        <off>0x00</off>
      </output>
    </outputs>
  </controller>
</MixxxControllerPreset>"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse(MAPPING).unwrap();
        assert_eq!(doc.info.name.as_deref(), Some("Test Controller"));
        assert_eq!(doc.info.author.as_deref(), Some("deckwire"));
        assert_eq!(doc.script_files.len(), 1);
        assert_eq!(doc.script_files[0].file_name, "test-controller.js");
        assert_eq!(
            doc.script_files[0].function_prefix.as_deref(),
            Some("TestController")
        );
        assert_eq!(doc.controls.len(), 3);
        assert_eq!(doc.outputs.len(), 1);
    }

    #[test]
    fn test_control_fields_and_hex_scalars() {
        let doc = parse(MAPPING).unwrap();
        let play = &doc.controls[0];
        assert_eq!(play.group, "[Channel1]");
        assert_eq!(play.key, "play");
        assert_eq!(play.status, 0x90);
        assert_eq!(play.midino, 0x0B);
        assert!(play.options.contains("normal"));
        assert_eq!(play.resolution, Resolution::Low);

        let rate = &doc.controls[1];
        assert_eq!(rate.status, 0xB0);
        assert_eq!(rate.midino, 33);
        assert_eq!(rate.resolution, Resolution::High);
    }

    #[test]
    fn test_options_lowercased_and_script_binding() {
        let doc = parse(MAPPING).unwrap();
        let jog = &doc.controls[2];
        assert!(jog.options.contains("script-binding"));
        assert!(jog.is_script_binding());
    }

    #[test]
    fn test_output_optional_fields_captured() {
        let doc = parse(MAPPING).unwrap();
        let out = &doc.outputs[0];
        assert_eq!(out.minimum, Some(0.5));
        assert_eq!(out.maximum, None);
        assert_eq!(out.on, Some(0x7F));
        assert_eq!(out.off, Some(0x00));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc = parse("<MixxxControllerPreset></MixxxControllerPreset>").unwrap();
        assert!(doc.info.name.is_none());
        assert!(doc.script_files.is_empty());
        assert!(doc.controls.is_empty());
        assert!(doc.outputs.is_empty());
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            parse("<a><b></a>"),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(parse(""), Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_control_missing_required_field() {
        let src = r#"<preset><controller><controls>
            <control><group>[Channel1]</group><key>play</key><status>0x90</status></control>
        </controls></controller></preset>"#;
        let err = parse(src).unwrap_err();
        assert!(err.to_string().contains("midino"), "{err}");
    }

    #[test]
    fn test_invalid_scalar_rejected() {
        let src = r#"<preset><controls>
            <control><group>g</group><key>k</key><status>banana</status><midino>1</midino></control>
        </controls></preset>"#;
        assert!(matches!(parse(src), Err(Error::MalformedDocument(_))));
    }
}
