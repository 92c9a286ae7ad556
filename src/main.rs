//! SDMX Fetcher CLI application
//!
//! Command-line interface for browsing the IMF SDMX data service and
//! exporting time series to CSV files or SQL Server tables.

use std::fs::{self, OpenOptions};
use std::process;
use std::sync::Mutex;

use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use sdmx_fetcher::cli::{
    build_client, handle_codelists, handle_config, handle_dataflows, handle_fetch, Cli, Commands,
};
use sdmx_fetcher::config::{AppConfig, LoggingConfig};
use sdmx_fetcher::errors::Result;
use sdmx_fetcher::tui;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging);

    info!("SDMX Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Dataflows(args) => handle_dataflows(args, &config, &cli.global).await,
        Commands::Codelists(args) => handle_codelists(args, &config, &cli.global).await,
        Commands::Fetch(args) => handle_fetch(args, &config, &cli.global).await,
        Commands::Browse => {
            let client = build_client(&config, &cli.global)?;
            tui::run(client, &config).await
        }
        Commands::Config(args) => handle_config(args, &config, &cli.global).await,
    }
}

/// Initialize logging based on verbosity flags and configuration
///
/// The browser owns the terminal, so it always logs to a file.
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .explicit_log_level()
        .or_else(|| logging.level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("sdmx_fetcher={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    let to_file = cli.is_interactive() || logging.file_logging;
    if !to_file {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(cli.global.very_verbose)
            .init();
        return;
    }

    let file = logging.resolved_log_file().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        // Nowhere to write; keep the terminal clean
        None => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}
