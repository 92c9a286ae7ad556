//! Core HTTP operations
//!
//! One GET per call: no retries and no client-side rate limiting. Failures
//! are classified into [`RemoteError`] variants so that callers can tell a
//! timeout from a server error from a transport failure.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::errors::{RemoteError, RemoteResult};

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    default_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler
    ///
    /// `default_timeout` must match the timeout the client was built with; it
    /// is only used to report how long a timed-out request waited.
    pub fn new(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    /// Fetches the body of `url` as text
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `timeout` - Per-request timeout overriding the client default
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Timeout` when the deadline expires,
    /// `RemoteError::ServerError` on a non-success status and
    /// `RemoteError::Http` on any other transport failure
    pub async fn get_page(&self, url: &Url, timeout: Option<Duration>) -> RemoteResult<String> {
        let mut request = self.client.get(url.as_str());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("GET {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e, url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} returned HTTP {}", url, status);
            return Err(RemoteError::ServerError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.classify(e, url, timeout))?;
        tracing::debug!("Fetched {} bytes from {}", text.len(), url);
        Ok(text)
    }

    fn classify(&self, error: reqwest::Error, url: &Url, timeout: Option<Duration>) -> RemoteError {
        if error.is_timeout() {
            let seconds = timeout.unwrap_or(self.default_timeout).as_secs();
            tracing::warn!("GET {} timed out after {}s", url, seconds);
            RemoteError::Timeout {
                url: url.to_string(),
                seconds,
            }
        } else {
            tracing::warn!("GET {} failed: {}", url, error);
            RemoteError::Http(error)
        }
    }
}
