//! Command-line interface components
//!
//! This module contains CLI-specific code for the SDMX Fetcher application:
//! argument parsing and the non-interactive command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, CodelistsArgs, Commands, ConfigAction, ConfigArgs, DataflowsArgs, FetchArgs, GlobalArgs,
};
pub use commands::{build_client, handle_codelists, handle_config, handle_dataflows, handle_fetch};
