//! Dataflow catalog parsing

use quick_xml::events::Event;

use super::{reader, xml_error, TextCapture};
use crate::app::models::DataflowSummary;
use crate::constants::xml;
use crate::errors::ParseResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    KeyFamilyId,
}

/// Dataflow under construction
#[derive(Debug)]
struct DataflowBuilder {
    depth: usize,
    name: Option<String>,
    key_family_id: Option<String>,
    capturing: Option<Field>,
}

impl DataflowBuilder {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            name: None,
            key_family_id: None,
            capturing: None,
        }
    }

    /// First occurrence of each field wins
    fn wants(&self, local_name: &[u8]) -> Option<Field> {
        if local_name == xml::NAME && self.name.is_none() {
            Some(Field::Name)
        } else if local_name == xml::KEY_FAMILY_ID && self.key_family_id.is_none() {
            Some(Field::KeyFamilyId)
        } else {
            None
        }
    }

    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::Name => self.name = Some(text),
            Field::KeyFamilyId => self.key_family_id = Some(text),
        }
    }

    /// Entries with a missing or empty name or identifier are dropped
    fn build(self) -> Option<DataflowSummary> {
        match (self.name, self.key_family_id) {
            (Some(name), Some(id)) if !name.is_empty() && !id.is_empty() => {
                Some(DataflowSummary::new(name, id))
            }
            _ => None,
        }
    }
}

/// Parse a dataflow listing into summaries sorted by name
///
/// Each `Dataflow` element contributes its first `Name` and first
/// `KeyFamilyID` descendant. The sort is stable, so dataflows sharing a name
/// keep document order.
pub fn parse_dataflows(document: &str) -> ParseResult<Vec<DataflowSummary>> {
    let mut reader = reader(document);
    let mut dataflows = Vec::new();
    let mut current: Option<DataflowBuilder> = None;
    let mut capture = TextCapture::default();
    let mut skipped = 0usize;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local = e.local_name();
                match current.as_mut() {
                    None if local.as_ref() == xml::DATAFLOW => {
                        current = Some(DataflowBuilder::new(depth));
                    }
                    Some(builder) if builder.capturing.is_none() => {
                        if let Some(field) = builder.wants(local.as_ref()) {
                            builder.capturing = Some(field);
                            capture.start(depth);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(builder) = current.as_mut() {
                    if builder.capturing.is_none() {
                        if let Some(field) = builder.wants(e.local_name().as_ref()) {
                            builder.set(field, String::new());
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if capture.is_active() {
                    let text = t.unescape().map_err(|e| xml_error(&reader, e))?;
                    capture.push(&text);
                }
            }
            Ok(Event::CData(c)) => {
                capture.push(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(_)) => {
                if let Some(builder) = current.as_mut() {
                    if let Some(text) = capture.finish_at(depth) {
                        if let Some(field) = builder.capturing.take() {
                            builder.set(field, text);
                        }
                    }
                    if builder.depth == depth {
                        match current.take().and_then(DataflowBuilder::build) {
                            Some(dataflow) => dataflows.push(dataflow),
                            None => skipped += 1,
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} dataflows without name or identifier", skipped);
    }

    dataflows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dataflows)
}
