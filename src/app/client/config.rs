//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used for all SDMX service calls.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, sdmx};
use crate::errors::RemoteResult;

/// Configuration for the SDMX HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service root, e.g. `http://dataservices.imf.org/REST/SDMX_XML.svc`
    pub base_url: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Tighter timeout for compact data requests
    pub series_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: sdmx::BASE_URL.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            series_timeout: http::SERIES_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> RemoteResult<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        Ok(client_builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, sdmx::BASE_URL);
        assert_eq!(config.series_timeout, http::SERIES_TIMEOUT);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_client_config_custom() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/sdmx".to_string(),
            series_timeout: Duration::from_secs(2),
            ..Default::default()
        };

        assert_eq!(config.series_timeout, Duration::from_secs(2));
        assert_eq!(config.request_timeout, http::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig::default();
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_http_client_with_custom_timeouts() {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: None,
            pool_idle_timeout: None,
            ..Default::default()
        };

        assert!(config.build_http_client().is_ok());
    }
}
