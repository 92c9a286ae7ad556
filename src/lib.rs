//! SDMX Fetcher Library
//!
//! A Rust library for browsing the IMF SDMX data service: list dataflows,
//! load their codelists, fetch the selected time series and export them to
//! CSV or a database table.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod tui;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
