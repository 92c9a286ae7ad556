//! CSV file export

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::models::SeriesTable;
use crate::constants::export::CSV_HEADER;
use crate::errors::{ExportError, ExportResult};

/// Write the observations of `table` to `path` as `timeperiod,value` CSV
///
/// The file is first written to a temporary sibling and then renamed over
/// `path`, so readers never see a partially written export.
///
/// # Errors
///
/// Returns `ExportError::InvalidDestination` if `path` has no file name or
/// names a directory, and `ExportError::Io`/`ExportError::Csv` on write failures
pub fn write_observations(table: &SeriesTable, path: &Path) -> ExportResult<usize> {
    if path.file_name().is_none() || path.is_dir() {
        return Err(ExportError::InvalidDestination {
            path: path.to_path_buf(),
        });
    }

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".sdmx-export-")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(io_error)?;

    {
        let mut writer = csv::Writer::from_writer(&mut temp);
        writer.write_record(CSV_HEADER)?;
        for observation in table.observations() {
            writer.write_record([&observation.timeperiod, &observation.value])?;
        }
        writer.flush().map_err(io_error)?;
    }
    temp.flush().map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;

    temp.persist(path).map_err(|e| io_error(e.error))?;

    let rows = table.observations().len();
    tracing::info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}
