//! Command-line argument parsing for SDMX Fetcher
//!
//! This module defines the CLI structure using clap derive macros: dataflow
//! discovery, codelist inspection, series fetch and export, the interactive
//! browser and configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::CodelistRole;
use crate::auth::ConnectionOverrides;

/// SDMX Fetcher - Browse and export IMF SDMX time series
#[derive(Parser, Debug)]
#[command(
    name = "sdmx_fetcher",
    version,
    about = "Browse and export time series from the IMF SDMX data service",
    long_about = "List dataflows, inspect their frequency, area and indicator codelists, fetch the
matching time series and export them to CSV or a SQL Server table. Run `browse` for the
interactive terminal interface."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SDMX service root (overrides the configured base_url)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the dataflows offered by the service
    Dataflows(DataflowsArgs),

    /// Show the frequency, area and indicator codelists of a dataflow
    Codelists(CodelistsArgs),

    /// Fetch series for a dataflow and optionally export one of them
    Fetch(FetchArgs),

    /// Interactive terminal browser
    Browse,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the dataflows command
#[derive(Args, Debug, Clone)]
pub struct DataflowsArgs {
    /// Only show dataflows whose name or id contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the codelists command
#[derive(Args, Debug, Clone)]
pub struct CodelistsArgs {
    /// Key family id of the dataflow (e.g., "IFS")
    pub key_family_id: String,

    /// Only show one codelist (frequency, area or indicator)
    #[arg(short, long)]
    pub role: Option<CodelistRole>,

    /// Print JSON instead of a listing
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Key family id of the dataflow (e.g., "IFS")
    pub key_family_id: String,

    /// Indicator code(s); at least one is required
    #[arg(short, long = "indicator", value_name = "CODE", required = true, num_args = 1..)]
    pub indicators: Vec<String>,

    /// Frequency code(s) (e.g., A, Q, M); all frequencies when omitted
    #[arg(long = "freq", value_name = "CODE", num_args = 1..)]
    pub frequencies: Vec<String>,

    /// Area code(s) (e.g., US, DE); all areas when omitted
    #[arg(short, long = "area", value_name = "CODE", num_args = 1..)]
    pub areas: Vec<String>,

    /// Series to export, 1-based in the order returned
    #[arg(short, long, default_value = "1")]
    pub series: usize,

    /// Write the selected series as CSV into this folder
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,

    /// CSV file name (default: <prefix>_<timestamp>.csv)
    #[arg(long, value_name = "NAME")]
    pub csv_name: Option<String>,

    /// Replace this database table with the selected series
    #[arg(long, value_name = "NAME")]
    pub db_table: Option<String>,

    /// Database host
    #[arg(long, value_name = "HOST")]
    pub db_host: Option<String>,

    /// Database port
    #[arg(long, value_name = "PORT")]
    pub db_port: Option<u16>,

    /// Database user
    #[arg(long, value_name = "USER")]
    pub db_user: Option<String>,

    /// Database name
    #[arg(long, value_name = "DB")]
    pub db_name: Option<String>,

    /// Print the fetched series as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the path of the configuration file in use
    Path,

    /// Write a commented default configuration file
    Init {
        /// Where to write (default: user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        self.explicit_log_level().unwrap_or(tracing::Level::WARN)
    }

    /// Logging level requested by a verbosity flag, if any
    pub fn explicit_log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.command, Commands::Browse)
    }
}

impl FetchArgs {
    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.series == 0 {
            return Err("--series is 1-based and must be at least 1".to_string());
        }
        if self.indicators.iter().any(|code| code.trim().is_empty()) {
            return Err("Indicator codes cannot be empty".to_string());
        }
        if self.csv_name.is_some() && self.csv_dir.is_none() {
            return Err("--csv-name requires --csv-dir".to_string());
        }
        Ok(())
    }

    /// Whether any export destination was requested
    pub fn wants_export(&self) -> bool {
        self.csv_dir.is_some() || self.db_table.is_some()
    }

    pub fn connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            database: self.db_name.clone(),
        }
    }
}
