//! Credential handling for database exports
//!
//! The SDMX service itself needs no authentication; only the database
//! export target does.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sdmx_fetcher::app::ConnectionInfo;
//! use sdmx_fetcher::auth::{resolve_connection, ConnectionOverrides};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let overrides = ConnectionOverrides {
//!     database: Some("imf".to_string()),
//!     ..Default::default()
//! };
//! let info = resolve_connection(ConnectionInfo::default(), &overrides, true)?;
//! println!("Exporting to {}:{}", info.host, info.port);
//! # Ok(())
//! # }
//! ```

pub mod credentials;

pub use credentials::{
    apply_environment, apply_overrides, get_credential_status, prompt_missing, require_complete,
    resolve_connection, ConnectionOverrides, CredentialStatus,
};
