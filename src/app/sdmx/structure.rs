//! Data structure (codelist) parsing

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};

use super::{attribute, reader, xml_error, TextCapture};
use crate::app::models::{ClassificationLists, CodeEntry, CodelistRole};
use crate::constants::xml;
use crate::errors::ParseResult;

/// Codelist being collected
#[derive(Debug)]
struct ListState {
    role: CodelistRole,
    depth: usize,
    entries: Vec<CodeEntry>,
}

/// Code being collected
#[derive(Debug)]
struct CodeState {
    depth: usize,
    value: Option<String>,
    description: Option<String>,
}

impl CodeState {
    fn into_entry(self) -> Option<CodeEntry> {
        let value = self.value?;
        Some(CodeEntry::new(self.description.unwrap_or_default(), value))
    }
}

/// Parse the codelists of a data structure message
///
/// Only the three codelists expected for `key_family_id` are kept (first
/// occurrence of each); codes without a `value` attribute are dropped and a
/// missing `Description` yields an empty description. Codelists absent from
/// the document map to empty lists.
pub fn parse_codelists(document: &str, key_family_id: &str) -> ParseResult<ClassificationLists> {
    let mut reader = reader(document);
    let mut lists = ClassificationLists::new(key_family_id);
    let mut seen: HashSet<CodelistRole> = HashSet::new();
    let mut list: Option<ListState> = None;
    let mut code: Option<CodeState> = None;
    let mut capture = TextCapture::default();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local = e.local_name();
                if list.is_none() {
                    if local.as_ref() == xml::CODE_LIST {
                        list = expected_list(&e, key_family_id, &seen, depth)?;
                    }
                } else if code.is_none() {
                    if local.as_ref() == xml::CODE {
                        code = Some(CodeState {
                            depth,
                            value: attribute(&e, xml::ATTR_VALUE)?,
                            description: None,
                        });
                    }
                } else if let Some(state) = code.as_ref() {
                    if local.as_ref() == xml::DESCRIPTION
                        && state.description.is_none()
                        && !capture.is_active()
                    {
                        capture.start(depth);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                if list.is_none() && local.as_ref() == xml::CODE_LIST {
                    // A self-closing list still claims its role
                    if let Some(empty) = expected_list(&e, key_family_id, &seen, depth)? {
                        tracing::debug!(
                            "Codelist {} is empty",
                            empty.role.codelist_id(key_family_id)
                        );
                        seen.insert(empty.role);
                        lists.set(empty.role, Vec::new());
                    }
                } else if let Some(list_state) = list.as_mut() {
                    match code.as_mut() {
                        None if local.as_ref() == xml::CODE => {
                            let state = CodeState {
                                depth,
                                value: attribute(&e, xml::ATTR_VALUE)?,
                                description: None,
                            };
                            list_state.entries.extend(state.into_entry());
                        }
                        Some(state)
                            if local.as_ref() == xml::DESCRIPTION
                                && state.description.is_none() =>
                        {
                            state.description = Some(String::new());
                        }
                        _ => {}
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
                if let Some(text) = capture.finish_at(depth) {
                    if let Some(state) = code.as_mut() {
                        state.description = Some(text);
                    }
                }
                if code.as_ref().is_some_and(|c| c.depth == depth) {
                    if let (Some(state), Some(list_state)) = (code.take(), list.as_mut()) {
                        list_state.entries.extend(state.into_entry());
                    }
                }
                if list.as_ref().is_some_and(|l| l.depth == depth) {
                    if let Some(finished) = list.take() {
                        tracing::debug!(
                            "Parsed codelist {} with {} codes",
                            finished.role.codelist_id(key_family_id),
                            finished.entries.len()
                        );
                        seen.insert(finished.role);
                        lists.set(finished.role, finished.entries);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    for role in CodelistRole::ALL {
        if !seen.contains(&role) {
            tracing::warn!(
                "Codelist {} not present in data structure; treating as empty",
                role.codelist_id(key_family_id)
            );
        }
    }

    Ok(lists)
}

/// Start collecting a `CodeList` element if it is one of the expected lists
/// and has not been seen yet
fn expected_list(
    element: &BytesStart<'_>,
    key_family_id: &str,
    seen: &HashSet<CodelistRole>,
    depth: usize,
) -> ParseResult<Option<ListState>> {
    let Some(id) = attribute(element, xml::ATTR_ID)? else {
        return Ok(None);
    };
    Ok(CodelistRole::from_codelist_id(&id, key_family_id)
        .filter(|role| !seen.contains(role))
        .map(|role| ListState {
            role,
            depth,
            entries: Vec::new(),
        }))
}
