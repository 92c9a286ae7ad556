//! Error types for SDMX Fetcher
//!
//! This module defines the error types for all components of the application.
//! Every client boundary returns one of these as a typed `Result`; callers
//! (ultimately the presentation layer) decide how to surface them.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure classification shared by all error types
///
/// The first three kinds form the user-facing taxonomy; the remaining kinds
/// cover input and setup problems detected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network, HTTP or timeout failure talking to a remote service
    RemoteUnavailable,
    /// Local file write failure or unusable destination
    IoFailure,
    /// Database rejected the write (permissions, schema, bad identifier)
    ConstraintViolation,
    /// Nothing is selected to operate on
    NoData,
    /// Request rejected before any I/O was attempted
    InvalidInput,
    /// Configuration could not be loaded or is inconsistent
    Configuration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::RemoteUnavailable => "remote unavailable",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::ConstraintViolation => "constraint violation",
            ErrorKind::NoData => "no data",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// XML payload parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// The document is not well-formed XML
    #[error("Malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// An attribute could not be decoded
    #[error("Invalid attribute on <{element}>: {reason}")]
    Attribute { element: String, reason: String },
}

/// Remote service errors (catalog, schema and series calls)
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error: HTTP {status} from {url}")]
    ServerError { status: u16, url: String },

    /// Request exceeded its deadline
    #[error("Request to {url} timed out after {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    /// Endpoint URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// The response body could not be parsed
    #[error("Malformed response payload: {0}")]
    MalformedPayload(#[from] ParseError),

    /// Request rejected before sending
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::InvalidUrl { .. } | RemoteError::InvalidRequest { .. } => {
                ErrorKind::InvalidInput
            }
            _ => ErrorKind::RemoteUnavailable,
        }
    }

    /// Whether the failure was a deadline expiry
    pub fn is_timeout(&self) -> bool {
        match self {
            RemoteError::Timeout { .. } => true,
            RemoteError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Export errors (CSV file and database table)
#[derive(Error, Debug)]
pub enum ExportError {
    /// No series table is currently selected
    #[error("No data to export")]
    NoData,

    /// File system failure writing the export
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoder failure
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// Destination is not a usable file path
    #[error("Invalid export destination: {path}")]
    InvalidDestination { path: PathBuf },

    /// Database server could not be reached or refused the login
    #[error("Database {host}:{port} unavailable: {reason}")]
    DatabaseUnavailable {
        host: String,
        port: u16,
        reason: String,
    },

    /// Table name is not a plain identifier
    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    /// Database rejected a statement
    #[error("Database write failed: {reason}")]
    Database { reason: String },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::NoData => ErrorKind::NoData,
            ExportError::Io { .. } | ExportError::Csv(_) | ExportError::InvalidDestination { .. } => {
                ErrorKind::IoFailure
            }
            ExportError::DatabaseUnavailable { .. } => ErrorKind::RemoteUnavailable,
            ExportError::InvalidTableName { .. } | ExportError::Database { .. } => {
                ErrorKind::ConstraintViolation
            }
        }
    }
}

impl From<tiberius::error::Error> for ExportError {
    fn from(error: tiberius::error::Error) -> Self {
        ExportError::Database {
            reason: error.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// I/O error reading or writing a config file
    #[error("Configuration file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No per-user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Database credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A required field was left empty
    #[error("Missing database {field}")]
    MissingField { field: String },

    /// Terminal interaction failed
    #[error("Failed to read credentials: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Errors raised by session operations driven from the presentation layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Fetch attempted while the indicator selection is empty
    #[error("Select at least one indicator before fetching data")]
    IndicatorRequired,

    /// Operation requires a chosen dataflow
    #[error("No dataflow selected")]
    NoDataflowSelected,

    /// Index does not address an item in the given list
    #[error("Index {index} out of range for {what} (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Generic I/O error (terminal setup, stdout)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Map onto the shared failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Remote(e) => e.kind(),
            AppError::Export(e) => e.kind(),
            AppError::Config(_) => ErrorKind::Configuration,
            AppError::Credential(_) | AppError::Session(_) => ErrorKind::InvalidInput,
            AppError::Io(_) => ErrorKind::IoFailure,
            AppError::Generic { .. } => ErrorKind::InvalidInput,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Remote(_) => "remote",
            AppError::Export(_) => "export",
            AppError::Config(_) => "config",
            AppError::Credential(_) => "credentials",
            AppError::Session(_) => "session",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Remote call result type alias
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// XML parsing result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Export result type alias
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Credential result type alias
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;
