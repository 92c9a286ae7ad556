//! Compact data message parsing

use quick_xml::events::{BytesStart, Event};

use super::{attribute, reader, xml_error};
use crate::app::models::{Observation, SeriesKey, SeriesTable};
use crate::constants::xml;
use crate::errors::ParseResult;

fn series_key(element: &BytesStart<'_>) -> ParseResult<SeriesKey> {
    Ok(SeriesKey {
        frequency: attribute(element, xml::ATTR_FREQ)?.unwrap_or_default(),
        area: attribute(element, xml::ATTR_REF_AREA)?.unwrap_or_default(),
        indicator: attribute(element, xml::ATTR_INDICATOR)?.unwrap_or_default(),
    })
}

fn observation(element: &BytesStart<'_>) -> ParseResult<Observation> {
    Ok(Observation {
        timeperiod: attribute(element, xml::ATTR_TIME_PERIOD)?.unwrap_or_default(),
        value: attribute(element, xml::ATTR_OBS_VALUE)?.unwrap_or_default(),
    })
}

/// Parse a compact data message into one table per `Series` element
///
/// Series identity comes from the `FREQ`, `REF_AREA` and `INDICATOR`
/// attributes and each `Obs` contributes `TIME_PERIOD` and `OBS_VALUE`, in
/// document order. Missing attributes read as empty strings.
pub fn parse_series(document: &str) -> ParseResult<Vec<SeriesTable>> {
    let mut reader = reader(document);
    let mut tables = Vec::new();
    let mut current: Option<(usize, SeriesTable)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local = e.local_name();
                match current.as_mut() {
                    None if local.as_ref() == xml::SERIES => {
                        current = Some((depth, SeriesTable::new(series_key(&e)?, Vec::new())));
                    }
                    Some((_, table)) if local.as_ref() == xml::OBS => {
                        table.observations.push(observation(&e)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                match current.as_mut() {
                    None if local.as_ref() == xml::SERIES => {
                        tables.push(SeriesTable::new(series_key(&e)?, Vec::new()));
                    }
                    Some((_, table)) if local.as_ref() == xml::OBS => {
                        table.observations.push(observation(&e)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                if current.as_ref().is_some_and(|(d, _)| *d == depth) {
                    if let Some((_, table)) = current.take() {
                        tables.push(table);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    tracing::debug!(
        "Parsed {} series with {} observations",
        tables.len(),
        tables.iter().map(|t| t.observations.len()).sum::<usize>()
    );

    Ok(tables)
}
