//! Configuration management for SDMX Fetcher
//!
//! Settings come from a single TOML file found in the standard locations,
//! with built-in defaults for anything the file leaves out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, ConnectionInfo};
use crate::constants::{config as locations, export, http, sdmx};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// SDMX service and HTTP client settings
    pub client: ClientConfigToml,
    /// CSV export settings
    pub export: ExportConfigToml,
    /// Database export defaults (the password is never stored here)
    pub database: DatabaseConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Service root URL
    pub base_url: String,
    /// Request timeout in seconds, applied to every call
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Timeout for series (compact data) requests in seconds
    pub series_timeout_secs: u64,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: sdmx::BASE_URL.to_string(),
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            series_timeout_secs: http::SERIES_TIMEOUT.as_secs(),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
        }
    }
}

/// TOML-friendly export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfigToml {
    /// Folder CSV files are written to (None = current directory)
    pub output_dir: Option<PathBuf>,
    /// Prefix of generated file names
    pub file_prefix: String,
}

impl Default for ExportConfigToml {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_prefix: export::DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl ExportConfigToml {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// TOML-friendly database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfigToml {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub database: Option<String>,
    /// Accept the server certificate without validation
    pub trust_server_certificate: bool,
    /// Seconds allowed to connect and log in
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfigToml {
    fn default() -> Self {
        Self {
            host: export::DEFAULT_DB_HOST.to_string(),
            port: export::DEFAULT_DB_PORT,
            user: None,
            database: None,
            trust_server_certificate: true,
            connect_timeout_secs: export::DB_CONNECT_TIMEOUT.as_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Write logs to a file instead of stderr
    pub file_logging: bool,
    /// Log file path (used by `browse`, and by other commands when
    /// file_logging is enabled)
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_logging: false,
            log_file: None,
        }
    }
}

impl LoggingConfig {
    /// Log file to use, falling back to `sdmx-fetcher.log` in the user
    /// data directory
    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file.clone().or_else(|| {
            dirs::data_local_dir().map(|dir| dir.join(locations::APP_DIR).join("sdmx-fetcher.log"))
        })
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, ConnectionInfo) {
        (
            self.client.to_runtime_config(),
            self.database.to_runtime_config(),
        )
    }

    /// Load configuration with precedence:
    /// 1. Explicit file (`--config`), which must exist
    /// 2. First file found in the standard locations
    /// 3. Built-in defaults
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Path of the config file that would be loaded, if any
    pub fn active_config_path(config_file_override: Option<&Path>) -> Option<PathBuf> {
        match config_file_override {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        }
    }

    /// Write the commented default configuration
    ///
    /// Writes to `path`, or to the per-user location when `None`. An existing
    /// file is only replaced when `force` is set.
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            info!("Config file already exists: {}", config_path.display());
            return Ok(config_path);
        }

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Created configuration file {}", config_path.display());
        Ok(config_path)
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(locations::LOCAL_FILE)];
        if let Ok(user_path) = Self::get_default_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(locations::APP_DIR).join(locations::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if url::Url::parse(&self.client.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "client.base_url".to_string(),
                value: self.client.base_url.clone(),
                reason: "Expected an absolute http(s) URL".to_string(),
            });
        }
        if self.client.series_timeout_secs == 0
            || self.client.request_timeout_secs == 0
            || self.database.connect_timeout_secs == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "*_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeouts must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# SDMX Fetcher Configuration
# Remove or comment out any setting to use its built-in default.

[client]
# SDMX XML service root
base_url = "{base_url}"
request_timeout_secs = {request_timeout}
connect_timeout_secs = {connect_timeout}
# Series (compact data) requests give up sooner than catalog and schema calls
series_timeout_secs = {series_timeout}
tcp_nodelay = true
pool_idle_timeout_secs = {pool_idle}

[export]
# Folder for CSV exports (default: current directory)
# output_dir = "/path/to/exports"
file_prefix = "{file_prefix}"

[database]
# SQL Server used by database exports.
# The password is read from SDMX_DB_PASSWORD or prompted for.
host = "{db_host}"
port = {db_port}
# user = "sdmx"
# database = "imf"
trust_server_certificate = true
# Give up on connecting and logging in after this many seconds
connect_timeout_secs = {db_connect_timeout}

[logging]
level = "warn"  # error, warn, info, debug, trace
file_logging = false
# log_file = "/path/to/sdmx-fetcher.log"
"#,
            base_url = sdmx::BASE_URL,
            request_timeout = http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout = http::CONNECT_TIMEOUT.as_secs(),
            series_timeout = http::SERIES_TIMEOUT.as_secs(),
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            file_prefix = export::DEFAULT_FILE_PREFIX,
            db_host = export::DEFAULT_DB_HOST,
            db_port = export::DEFAULT_DB_PORT,
            db_connect_timeout = export::DB_CONNECT_TIMEOUT.as_secs(),
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            series_timeout: Duration::from_secs(self.series_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            ..ClientConfig::default()
        }
    }
}

impl DatabaseConfigToml {
    /// Convert to connection defaults; credentials are resolved separately
    pub fn to_runtime_config(&self) -> ConnectionInfo {
        ConnectionInfo {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone().unwrap_or_default(),
            password: String::new(),
            database: self.database.clone().unwrap_or_default(),
            trust_server_certificate: self.trust_server_certificate,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}
