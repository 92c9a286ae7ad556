//! Export of the currently browsed series
//!
//! Both destinations project a series table onto `(timeperiod, value)` rows,
//! excluding the metadata row, and both report `ExportError::NoData` when no
//! table is selected.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::app::models::SeriesTable;
use crate::constants::export::{CSV_EXTENSION, DEFAULT_FILE_PREFIX, FILE_TIMESTAMP_FORMAT};
use crate::errors::{ExportError, ExportResult};

pub mod database;
pub mod file;

pub use database::{validate_table_name, ConnectionInfo, MssqlSink, TableSink};

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// File path or table name written
    pub destination: String,
    /// Observation rows written (header excluded)
    pub rows: usize,
}

/// Export the selected table as CSV to `path`
///
/// # Errors
///
/// Returns `ExportError::NoData` if `table` is `None`, otherwise see
/// [`file::write_observations`]
pub fn export_to_file(table: Option<&SeriesTable>, path: &Path) -> ExportResult<ExportSummary> {
    let table = table.ok_or(ExportError::NoData)?;
    let rows = file::write_observations(table, path)?;
    Ok(ExportSummary {
        destination: path.display().to_string(),
        rows,
    })
}

/// Export the selected table into `table_name` through `sink`
///
/// # Errors
///
/// Returns `ExportError::NoData` if `table` is `None`,
/// `ExportError::InvalidTableName` for a name that is not a plain identifier,
/// and whatever the sink reports on write failure
pub async fn export_to_database<S>(
    table: Option<&SeriesTable>,
    sink: &mut S,
    table_name: &str,
) -> ExportResult<ExportSummary>
where
    S: TableSink + ?Sized,
{
    let table = table.ok_or(ExportError::NoData)?;
    validate_table_name(table_name)?;

    sink.replace_table(table_name, table.observations()).await?;
    Ok(ExportSummary {
        destination: table_name.to_string(),
        rows: table.observations().len(),
    })
}

/// Connect to SQL Server and export the selected table
///
/// Nothing is sent over the network when there is no data or the table name
/// is invalid.
///
/// # Errors
///
/// As [`export_to_database`], plus `ExportError::DatabaseUnavailable` when the
/// connection or login fails
pub async fn export_to_sql_server(
    table: Option<&SeriesTable>,
    info: &ConnectionInfo,
    table_name: &str,
) -> ExportResult<ExportSummary> {
    let table = table.ok_or(ExportError::NoData)?;
    validate_table_name(table_name)?;

    let mut sink = MssqlSink::connect(info).await?;
    export_to_database(Some(table), &mut sink, table_name).await
}

/// Generated file stem, e.g. `imf_data_20240131_235959`
///
/// A blank prefix falls back to `imf_data`.
pub fn default_file_name(prefix: &str, now: DateTime<Local>) -> String {
    let prefix = match prefix.trim() {
        "" => DEFAULT_FILE_PREFIX,
        prefix => prefix,
    };
    format!("{}_{}", prefix, now.format(FILE_TIMESTAMP_FORMAT))
}

/// Resolve the CSV path for a folder and an optional user-supplied name
///
/// A blank name falls back to [`default_file_name`] with `prefix`. The `.csv`
/// extension is appended unless already present.
pub fn csv_destination(folder: &Path, name: Option<&str>, prefix: &str) -> PathBuf {
    let stem = match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_file_name(prefix, Local::now()),
    };

    let has_extension = Path::new(&stem)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));
    if has_extension {
        folder.join(stem)
    } else {
        folder.join(format!("{}.{}", stem, CSV_EXTENSION))
    }
}
