//! HTTP client for SDMX data-dissemination services
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: single GET requests with failure classification
//!
//! [`SdmxClient`] exposes the three remote operations (catalog, schema and
//! series). [`DataSource`] abstracts them so that background tasks and the
//! session can run against an in-memory source in tests.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::app::models::{ClassificationLists, DataflowSummary, SeriesTable};
use crate::app::query::SeriesQuery;
use crate::app::sdmx;
use crate::app::selection::Selection;
use crate::constants::sdmx as endpoints;
use crate::errors::{RemoteError, RemoteResult};

pub mod config;
pub mod http;

#[cfg(test)]
mod tests;

pub use config::ClientConfig;

use http::HttpHandler;

/// Remote operations needed by the browsing workflow
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Available dataflows sorted by name
    async fn list_dataflows(&self) -> RemoteResult<Vec<DataflowSummary>>;

    /// The three classification lists of a dataflow
    async fn fetch_schema(&self, key_family_id: &str) -> RemoteResult<ClassificationLists>;

    /// One table per series matching the query
    async fn fetch_series(&self, query: &SeriesQuery) -> RemoteResult<Vec<SeriesTable>>;
}

/// HTTP client for an SDMX XML service
#[derive(Debug)]
pub struct SdmxClient {
    http_handler: HttpHandler,
    base_url: Url,
    series_timeout: Duration,
}

impl SdmxClient {
    /// Creates a client for the default service
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if HTTP client creation fails
    pub fn new() -> RemoteResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidUrl` if the base URL cannot be parsed or
    /// cannot carry path segments, and `RemoteError::Http` if the HTTP client
    /// cannot be built
    pub fn with_config(config: ClientConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| RemoteError::InvalidUrl {
            url: config.base_url.clone(),
            error: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl {
                url: config.base_url.clone(),
                error: "URL cannot be used as a base".to_string(),
            });
        }

        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.request_timeout);

        tracing::info!("Created SDMX client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
            series_timeout: config.series_timeout,
        })
    }

    /// Get the service root URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL by appending path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl {
                url: self.base_url.to_string(),
                error: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn require_key_family_id(key_family_id: &str) -> RemoteResult<()> {
        if key_family_id.trim().is_empty() {
            return Err(RemoteError::InvalidRequest {
                reason: "key family id is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Fetches the dataflow catalog
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on transport, HTTP status or payload failures
    pub async fn list_dataflows(&self) -> RemoteResult<Vec<DataflowSummary>> {
        let url = self.endpoint(&[endpoints::DATAFLOW_PATH])?;
        let body = self.http_handler.get_page(&url, None).await?;
        let dataflows = sdmx::parse_dataflows(&body)?;
        tracing::info!("Loaded {} dataflows", dataflows.len());
        Ok(dataflows)
    }

    /// Fetches the frequency, area and indicator codelists of a dataflow
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidRequest` for an empty key family id and
    /// `RemoteError` on transport, HTTP status or payload failures
    pub async fn fetch_schema(&self, key_family_id: &str) -> RemoteResult<ClassificationLists> {
        Self::require_key_family_id(key_family_id)?;
        let url = self.endpoint(&[endpoints::DATA_STRUCTURE_PATH, key_family_id])?;
        let body = self.http_handler.get_page(&url, None).await?;
        let lists = sdmx::parse_codelists(&body, key_family_id)?;
        tracing::info!(
            "Loaded data structure for {}: {}",
            key_family_id,
            lists
                .iter()
                .map(|(_, id, codes)| format!("{}={}", id, codes.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(lists)
    }

    /// Fetches the series selected for a dataflow
    ///
    /// # Errors
    ///
    /// See [`SdmxClient::fetch_series_query`]
    pub async fn fetch_series(
        &self,
        key_family_id: &str,
        selection: &Selection,
    ) -> RemoteResult<Vec<SeriesTable>> {
        self.fetch_series_query(&SeriesQuery::new(key_family_id, selection))
            .await
    }

    /// Fetches compact data for a query snapshot, bounded by the series timeout
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Timeout` if the series timeout expires and
    /// `RemoteError` on transport, HTTP status or payload failures
    pub async fn fetch_series_query(&self, query: &SeriesQuery) -> RemoteResult<Vec<SeriesTable>> {
        Self::require_key_family_id(query.key_family_id())?;
        let key_path = query.key_path();
        // A path of only separators is a dot segment and would be dropped from the URL
        if key_path.chars().all(|c| c == '.') {
            return Err(RemoteError::InvalidRequest {
                reason: "at least one dimension code must be selected".to_string(),
            });
        }
        let url = self.endpoint(&[
            endpoints::COMPACT_DATA_PATH,
            query.key_family_id(),
            &key_path,
        ])?;
        let body = self
            .http_handler
            .get_page(&url, Some(self.series_timeout))
            .await?;
        let tables = sdmx::parse_series(&body)?;
        tracing::info!(
            "Fetched {} series for {}/{}",
            tables.len(),
            query.key_family_id(),
            key_path
        );
        Ok(tables)
    }
}

#[async_trait]
impl DataSource for SdmxClient {
    async fn list_dataflows(&self) -> RemoteResult<Vec<DataflowSummary>> {
        SdmxClient::list_dataflows(self).await
    }

    async fn fetch_schema(&self, key_family_id: &str) -> RemoteResult<ClassificationLists> {
        SdmxClient::fetch_schema(self, key_family_id).await
    }

    async fn fetch_series(&self, query: &SeriesQuery) -> RemoteResult<Vec<SeriesTable>> {
        self.fetch_series_query(query).await
    }
}
