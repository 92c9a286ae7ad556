//! Data models for SDMX Fetcher
//!
//! This module defines the core data structures used throughout the
//! application: dataflow summaries, codelist entries, the three classification
//! lists of a dataflow, and the series tables returned by data queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::codelists;

/// A dataflow offered by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataflowSummary {
    /// Human readable name (e.g., "Balance of Payments")
    pub name: String,
    /// Key family identifier used to address schema and data (e.g., "BOP")
    pub key_family_id: String,
}

impl DataflowSummary {
    pub fn new(name: impl Into<String>, key_family_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_family_id: key_family_id.into(),
        }
    }
}

/// One selectable code within a classification list
///
/// Equality is by `value` only: two entries with the same code but different
/// descriptions (e.g., different languages) are the same selection.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Description shown to the user (e.g., "United States")
    pub description: String,
    /// Code used in queries (e.g., "US")
    pub value: String,
}

impl CodeEntry {
    pub fn new(description: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            value: value.into(),
        }
    }

    /// Entry for a bare code whose description is unknown
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new(String::new(), value)
    }

    /// Display form "Description (value)", or just the value
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.value.clone()
        } else {
            format!("{} ({})", self.description, self.value)
        }
    }
}

impl PartialEq for CodeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl std::hash::Hash for CodeEntry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Role of a classification list within a dataflow
///
/// Ordering follows the dimension order of a compact data key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodelistRole {
    Frequency,
    Area,
    Indicator,
}

impl CodelistRole {
    /// All roles in key path order
    pub const ALL: [CodelistRole; 3] = [
        CodelistRole::Frequency,
        CodelistRole::Area,
        CodelistRole::Indicator,
    ];

    /// Codelist identifier for this role in the given dataflow
    pub fn codelist_id(&self, key_family_id: &str) -> String {
        match self {
            CodelistRole::Frequency => codelists::FREQUENCY.to_string(),
            CodelistRole::Area => format!("{}{}", codelists::AREA_PREFIX, key_family_id),
            CodelistRole::Indicator => format!("{}{}", codelists::INDICATOR_PREFIX, key_family_id),
        }
    }

    /// Resolve a codelist identifier to its role, if it is one of the three
    /// expected for `key_family_id`
    pub fn from_codelist_id(codelist_id: &str, key_family_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.codelist_id(key_family_id) == codelist_id)
    }

    /// Position in key path order
    pub fn index(&self) -> usize {
        match self {
            CodelistRole::Frequency => 0,
            CodelistRole::Area => 1,
            CodelistRole::Indicator => 2,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CodelistRole::Frequency => "Frequency",
            CodelistRole::Area => "Area",
            CodelistRole::Indicator => "Indicator",
        }
    }
}

impl std::fmt::Display for CodelistRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

impl std::str::FromStr for CodelistRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frequency" | "freq" => Ok(CodelistRole::Frequency),
            "area" => Ok(CodelistRole::Area),
            "indicator" => Ok(CodelistRole::Indicator),
            other => Err(format!(
                "unknown codelist role '{}', expected frequency, area or indicator",
                other
            )),
        }
    }
}

/// The three classification lists of one dataflow
///
/// Always holds exactly one (possibly empty) list per role. An empty list
/// means the remote schema did not provide that codelist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationLists {
    key_family_id: String,
    lists: BTreeMap<CodelistRole, Vec<CodeEntry>>,
}

impl ClassificationLists {
    /// Empty lists for every role of `key_family_id`
    pub fn new(key_family_id: impl Into<String>) -> Self {
        Self {
            key_family_id: key_family_id.into(),
            lists: CodelistRole::ALL
                .into_iter()
                .map(|role| (role, Vec::new()))
                .collect(),
        }
    }

    pub fn key_family_id(&self) -> &str {
        &self.key_family_id
    }

    pub fn set(&mut self, role: CodelistRole, entries: Vec<CodeEntry>) {
        self.lists.insert(role, entries);
    }

    /// Codes for `role`; empty when the schema omitted that list
    pub fn codes(&self, role: CodelistRole) -> &[CodeEntry] {
        self.lists.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(role, codelist id, codes)` in key path order
    pub fn iter(&self) -> impl Iterator<Item = (CodelistRole, String, &[CodeEntry])> + '_ {
        CodelistRole::ALL
            .into_iter()
            .map(move |role| (role, role.codelist_id(&self.key_family_id), self.codes(role)))
    }

    /// Whether every list is empty (nothing to display)
    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }
}

/// Identity of a series: the first, metadata-only row of a series table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub frequency: String,
    pub area: String,
    pub indicator: String,
}

impl SeriesKey {
    /// Label "<freq>_<area>_<indicator>" used when presenting a series
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.frequency, self.area, self.indicator)
    }
}

/// One `(timeperiod, value)` pair within a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub timeperiod: String,
    pub value: String,
}

impl Observation {
    pub fn new(timeperiod: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            timeperiod: timeperiod.into(),
            value: value.into(),
        }
    }
}

/// A logical row of a series table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRow<'a> {
    /// Row 0, carrying series identity only
    Header(&'a SeriesKey),
    /// Rows 1.., one per observation
    Observation(&'a Observation),
}

/// One returned time series
///
/// Logically row 0 is the series key and rows 1.. are observations in the
/// order the service returned them. Exports use [`SeriesTable::observations`],
/// which never includes row 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesTable {
    pub key: SeriesKey,
    pub observations: Vec<Observation>,
}

impl SeriesTable {
    pub fn new(key: SeriesKey, observations: Vec<Observation>) -> Self {
        Self { key, observations }
    }

    pub fn label(&self) -> String {
        self.key.label()
    }

    /// Exportable rows (row 0 excluded)
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of logical rows including the metadata row
    pub fn row_count(&self) -> usize {
        self.observations.len() + 1
    }

    /// All logical rows, metadata row first
    pub fn rows(&self) -> impl Iterator<Item = SeriesRow<'_>> {
        std::iter::once(SeriesRow::Header(&self.key))
            .chain(self.observations.iter().map(SeriesRow::Observation))
    }
}
