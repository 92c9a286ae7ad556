//! SDMX-ML payload parsing
//!
//! Streaming parsers for the three XML documents the client consumes:
//! - `catalog`: dataflow listings
//! - `structure`: data structure definitions (codelists)
//! - `compact`: compact data messages (series and observations)
//!
//! Element names are matched on their local part so that namespace prefixes
//! used by different service versions do not matter.

use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

use crate::errors::{ParseError, ParseResult};

pub mod catalog;
pub mod compact;
pub mod structure;

#[cfg(test)]
mod tests;

pub use catalog::parse_dataflows;
pub use compact::parse_series;
pub use structure::parse_codelists;

/// Create a reader over an in-memory document with whitespace trimmed
fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn xml_error(reader: &Reader<&[u8]>, source: quick_xml::Error) -> ParseError {
    ParseError::Xml {
        position: reader.buffer_position() as u64,
        source,
    }
}

/// Read an attribute by local name, unescaped
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> ParseResult<Option<String>> {
    let element_name = || String::from_utf8_lossy(element.local_name().as_ref()).into_owned();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| ParseError::Attribute {
            element: element_name(),
            reason: e.to_string(),
        })?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(|e| ParseError::Attribute {
                element: element_name(),
                reason: e.to_string(),
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Collects the text content of one element, including nested text
#[derive(Debug, Default)]
struct TextCapture {
    depth: Option<usize>,
    buffer: String,
}

impl TextCapture {
    fn start(&mut self, depth: usize) {
        self.depth = Some(depth);
        self.buffer.clear();
    }

    fn is_active(&self) -> bool {
        self.depth.is_some()
    }

    fn push(&mut self, text: &str) {
        if self.is_active() {
            self.buffer.push_str(text);
        }
    }

    /// Finish the capture if `depth` closes the captured element
    fn finish_at(&mut self, depth: usize) -> Option<String> {
        if self.depth == Some(depth) {
            self.depth = None;
            Some(std::mem::take(&mut self.buffer).trim().to_string())
        } else {
            None
        }
    }
}
