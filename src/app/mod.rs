//! Core application logic for SDMX Fetcher
//!
//! This module contains the remote client and its XML payload parsers, the
//! selection and browsing state, background task handling and the exporters.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sdmx_fetcher::app::{CodelistRole, SdmxClient, Selection};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SdmxClient::new()?;
//! let dataflows = client.list_dataflows().await?;
//! let ifs = &dataflows[0];
//!
//! let lists = client.fetch_schema(&ifs.key_family_id).await?;
//! let mut selection = Selection::new();
//! if let Some(code) = lists.codes(CodelistRole::Indicator).first() {
//!     selection.toggle(CodelistRole::Indicator, code.clone());
//! }
//!
//! for table in client.fetch_series(&ifs.key_family_id, &selection).await? {
//!     println!("{}: {} observations", table.label(), table.observations().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod client;
pub mod export;
pub mod models;
pub mod query;
pub mod sdmx;
pub mod selection;
pub mod session;
pub mod tasks;

// Re-export main public API
pub use browser::DatasetBrowser;
pub use client::{ClientConfig, DataSource, SdmxClient};
pub use export::{
    csv_destination, export_to_database, export_to_file, export_to_sql_server, ConnectionInfo,
    ExportSummary, TableSink,
};
pub use models::{
    ClassificationLists, CodeEntry, CodelistRole, DataflowSummary, Observation, SeriesKey,
    SeriesTable,
};
pub use query::SeriesQuery;
pub use selection::Selection;
pub use session::{Session, SessionUpdate};
pub use tasks::{Completion, TaskKind, TaskOutcome, TaskQueue, Ticket};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert!(DatasetBrowser::new().is_empty());
        assert_eq!(ConnectionInfo::default().port, 1433);
    }
}
