//! Message source readers
//!
//! Expected XML (SMS Backup & Restore layout):
//!   <smses count="2">
//!     <sms address="M-Money" date="1683014100000" body="You have received RWF ..." />
//!   </smses>
//!
//! JSON input is an array of objects with the same `body`/`date`/`address` keys.

use anyhow::{Context, Result, bail};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs;
use std::path::Path;
use tracing::info;

use momo_core::RawMessage;

use crate::types::SourceFormat;

/// Read every message from an XML or JSON export.
///
/// Any I/O or format problem is fatal for the run.
pub fn read_messages(path: impl AsRef<Path>) -> Result<Vec<RawMessage>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let messages = match SourceFormat::from_path(path) {
        SourceFormat::Xml => parse_sms_xml(&text),
        SourceFormat::Json => parse_sms_json(&text),
    }
    .with_context(|| format!("parsing {}", path.display()))?;

    info!(count = messages.len(), path = %path.display(), "read SMS messages");
    Ok(messages)
}

/// Parse an `<smses>` backup. `<sms>` elements outside the root are ignored.
pub fn parse_sms_xml(xml: &str) -> Result<Vec<RawMessage>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_root = false;
    let mut saw_root = false;
    let mut out = Vec::new();

    loop {
        let pos = reader.buffer_position();
        let event = reader
            .read_event()
            .with_context(|| format!("malformed XML near byte {pos}"))?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"smses" => {
                in_root = true;
                saw_root = true;
            }
            Event::Empty(e) if e.name().as_ref() == b"smses" => {
                saw_root = true;
            }
            Event::End(e) if e.name().as_ref() == b"smses" => {
                in_root = false;
            }
            Event::Start(e) | Event::Empty(e) if in_root && e.name().as_ref() == b"sms" => {
                out.push(sms_from_attributes(&e)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("XML structure not as expected: no <smses> root element");
    }
    Ok(out)
}

fn sms_from_attributes(e: &BytesStart<'_>) -> Result<RawMessage> {
    let mut msg = RawMessage::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"body" => msg.body = Some(value),
            b"date" => msg.date = Some(value),
            b"address" => msg.address = value,
            _ => {}
        }
    }
    Ok(msg)
}

/// Parse a JSON array of message objects; unknown keys are ignored.
pub fn parse_sms_json(json: &str) -> Result<Vec<RawMessage>> {
    Ok(serde_json::from_str(json)?)
}
