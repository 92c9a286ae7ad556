//! Application constants for SDMX Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for database credentials
pub mod env {
    /// Database host override
    pub const DB_HOST: &str = "SDMX_DB_HOST";

    /// Database user name
    pub const DB_USER: &str = "SDMX_DB_USER";

    /// Database password
    pub const DB_PASSWORD: &str = "SDMX_DB_PASSWORD";

    /// Database (catalog) name
    pub const DB_NAME: &str = "SDMX_DB_NAME";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("SDMX-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout, applied to every remote call
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Tighter timeout used for compact data (series) requests
    pub const SERIES_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// SDMX service URLs and endpoint names
pub mod sdmx {
    /// IMF SDMX XML service root
    pub const BASE_URL: &str = "http://dataservices.imf.org/REST/SDMX_XML.svc";

    /// Dataflow catalog endpoint
    pub const DATAFLOW_PATH: &str = "Dataflow";

    /// Data structure endpoint, followed by the key family id
    pub const DATA_STRUCTURE_PATH: &str = "DataStructure";

    /// Compact data endpoint, followed by key family id and key path
    pub const COMPACT_DATA_PATH: &str = "CompactData";

    /// Separator between codes of one dimension in a key path
    pub const VALUE_SEPARATOR: &str = "+";

    /// Separator between dimensions in a key path
    pub const DIMENSION_SEPARATOR: &str = ".";
}

/// Codelist identifiers
pub mod codelists {
    /// Frequency codelist, shared by all dataflows
    pub const FREQUENCY: &str = "CL_FREQ";

    /// Prefix of the per-dataflow area codelist
    pub const AREA_PREFIX: &str = "CL_AREA_";

    /// Prefix of the per-dataflow indicator codelist
    pub const INDICATOR_PREFIX: &str = "CL_INDICATOR_";
}

/// XML element and attribute names found in SDMX 2.0 payloads
pub mod xml {
    pub const DATAFLOW: &[u8] = b"Dataflow";
    pub const NAME: &[u8] = b"Name";
    pub const KEY_FAMILY_ID: &[u8] = b"KeyFamilyID";

    pub const CODE_LIST: &[u8] = b"CodeList";
    pub const CODE: &[u8] = b"Code";
    pub const DESCRIPTION: &[u8] = b"Description";
    pub const ATTR_ID: &[u8] = b"id";
    pub const ATTR_VALUE: &[u8] = b"value";

    pub const SERIES: &[u8] = b"Series";
    pub const OBS: &[u8] = b"Obs";
    pub const ATTR_FREQ: &[u8] = b"FREQ";
    pub const ATTR_REF_AREA: &[u8] = b"REF_AREA";
    pub const ATTR_INDICATOR: &[u8] = b"INDICATOR";
    pub const ATTR_TIME_PERIOD: &[u8] = b"TIME_PERIOD";
    pub const ATTR_OBS_VALUE: &[u8] = b"OBS_VALUE";
}

/// Export constants
pub mod export {
    use super::Duration;

    /// CSV header, in column order
    pub const CSV_HEADER: [&str; 2] = ["timeperiod", "value"];

    /// CSV file extension
    pub const CSV_EXTENSION: &str = "csv";

    /// Prefix for generated export file names
    pub const DEFAULT_FILE_PREFIX: &str = "imf_data";

    /// Timestamp format appended to generated file names
    pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Default database host
    pub const DEFAULT_DB_HOST: &str = "127.0.0.1";

    /// Default SQL Server port
    pub const DEFAULT_DB_PORT: u16 = 1433;

    /// Time allowed to connect and log in to the database
    pub const DB_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Maximum length of a table identifier
    pub const MAX_TABLE_NAME_LENGTH: usize = 128;

    /// Rows per INSERT statement (two parameters per row, well under the
    /// 2100 parameter limit of a TDS request)
    pub const INSERT_BATCH_ROWS: usize = 500;

    /// Width of the text columns in exported tables
    pub const TEXT_COLUMN_WIDTH: usize = 255;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_FILE: &str = "sdmx-fetcher.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "sdmx-fetcher";

    /// File name inside the user config dir
    pub const FILE_NAME: &str = "config.toml";
}

/// Terminal UI constants
pub mod tui {
    use super::Duration;

    /// Input poll interval; completions are drained once per tick
    pub const TICK_RATE: Duration = Duration::from_millis(100);

    /// Maximum number of status messages retained
    pub const MAX_STATUS_MESSAGES: usize = 50;
}

pub use http::USER_AGENT;
