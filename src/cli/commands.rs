//! Command handlers for the SDMX Fetcher CLI
//!
//! Each handler runs one subcommand to completion. Network calls show an
//! `indicatif` spinner on stderr when it is a terminal.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{debug, info};

use crate::app::{
    export_to_file, export_to_sql_server, csv_destination, CodelistRole, DatasetBrowser,
    SdmxClient, SeriesQuery, SeriesTable,
};
use crate::auth::{get_credential_status, resolve_connection};
use crate::cli::args::{
    CodelistsArgs, ConfigAction, ConfigArgs, DataflowsArgs, FetchArgs, GlobalArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, ExportError, Result, SessionError};

/// Build the SDMX client from configuration and global flags
pub fn build_client(config: &AppConfig, global: &GlobalArgs) -> Result<SdmxClient> {
    let mut client_config = config.client.to_runtime_config();
    if let Some(base_url) = &global.base_url {
        client_config.base_url = base_url.clone();
    }
    Ok(SdmxClient::with_config(client_config)?)
}

/// Spinner on stderr, hidden when quiet or not attached to a terminal
fn spinner(message: impl Into<String>, global: &GlobalArgs) -> ProgressBar {
    if global.quiet || !atty::is(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Handle the dataflows command
pub async fn handle_dataflows(
    args: DataflowsArgs,
    config: &AppConfig,
    global: &GlobalArgs,
) -> Result<()> {
    let client = build_client(config, global)?;

    let progress = spinner("Loading dataflow catalog...", global);
    let result = client.list_dataflows().await;
    progress.finish_and_clear();
    let mut dataflows = result?;

    if let Some(filter) = &args.filter {
        let needle = filter.to_lowercase();
        dataflows.retain(|d| {
            d.name.to_lowercase().contains(&needle)
                || d.key_family_id.to_lowercase().contains(&needle)
        });
        debug!("{} dataflows match '{}'", dataflows.len(), filter);
    }

    if args.json {
        println!("{}", to_json(&dataflows)?);
        return Ok(());
    }

    if dataflows.is_empty() {
        println!("No dataflows found");
        return Ok(());
    }

    let id_width = dataflows
        .iter()
        .map(|d| d.key_family_id.len())
        .max()
        .unwrap_or(0);
    for dataflow in &dataflows {
        println!(
            "{:<width$}  {}",
            dataflow.key_family_id,
            dataflow.name,
            width = id_width
        );
    }
    if !global.quiet {
        println!();
        println!("{} dataflows", dataflows.len());
    }
    Ok(())
}

/// Handle the codelists command
pub async fn handle_codelists(
    args: CodelistsArgs,
    config: &AppConfig,
    global: &GlobalArgs,
) -> Result<()> {
    let client = build_client(config, global)?;

    let progress = spinner(
        format!("Loading data structure for {}...", args.key_family_id),
        global,
    );
    let result = client.fetch_schema(&args.key_family_id).await;
    progress.finish_and_clear();
    let lists = result?;

    let roles: Vec<CodelistRole> = match args.role {
        Some(role) => vec![role],
        None => CodelistRole::ALL.to_vec(),
    };

    if args.json {
        let codelists: Vec<_> = lists
            .iter()
            .filter(|(role, _, _)| roles.contains(role))
            .map(|(role, id, codes)| json!({ "role": role, "id": id, "codes": codes }))
            .collect();
        println!("{}", to_json(&codelists)?);
        return Ok(());
    }

    if lists.is_empty() {
        println!("No data structures to display");
        return Ok(());
    }

    for (role, id, codes) in lists.iter().filter(|(role, _, _)| roles.contains(role)) {
        println!("{} ({}), {} codes", role, id, codes.len());
        if codes.is_empty() {
            println!("  (not provided by this dataflow)");
        }
        for code in codes {
            println!("  {:<12} {}", code.value, code.description);
        }
        println!();
    }
    Ok(())
}

/// Handle the fetch command
pub async fn handle_fetch(args: FetchArgs, config: &AppConfig, global: &GlobalArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let client = build_client(config, global)?;

    let query = SeriesQuery::from_values(
        args.key_family_id.clone(),
        args.frequencies.clone(),
        args.areas.clone(),
        args.indicators.clone(),
    );
    info!(
        "Fetching {}/{}",
        query.key_family_id(),
        query.key_path()
    );

    let started = Instant::now();
    let progress = spinner(format!("Fetching {}...", query.key_path()), global);
    let result = client.fetch_series_query(&query).await;
    progress.finish_and_clear();
    let tables = result?;
    debug!("Fetch took {:?}", started.elapsed());

    if args.json {
        println!("{}", to_json(&tables)?);
    } else {
        print_series_summary(&tables, global);
    }

    if !args.wants_export() {
        return Ok(());
    }

    let mut browser = DatasetBrowser::new();
    browser.replace(tables);
    if !browser.is_empty() && args.series > browser.len() {
        return Err(SessionError::IndexOutOfRange {
            what: "series",
            index: args.series,
            len: browser.len(),
        }
        .into());
    }
    for _ in 1..args.series {
        browser.next();
    }

    if let Some(folder) = &args.csv_dir {
        let path = csv_destination(folder, args.csv_name.as_deref(), &config.export.file_prefix);
        let summary = export_to_file(browser.current(), &path)?;
        if !global.quiet {
            println!("Saved {} rows to {}", summary.rows, summary.destination);
        }
    }

    if let Some(table_name) = &args.db_table {
        // Fail fast before prompting for credentials
        let table = browser.current().ok_or(ExportError::NoData)?;
        let interactive = atty::is(atty::Stream::Stdin);
        let info = resolve_connection(
            config.database.to_runtime_config(),
            &args.connection_overrides(),
            interactive,
        )?;

        let progress = spinner(
            format!("Writing {} to {}:{}...", table_name, info.host, info.port),
            global,
        );
        let result = export_to_sql_server(Some(table), &info, table_name).await;
        progress.finish_and_clear();
        let summary = result?;
        if !global.quiet {
            println!("Saved {} rows to table {}", summary.rows, summary.destination);
        }
    }

    Ok(())
}

fn print_series_summary(tables: &[SeriesTable], global: &GlobalArgs) {
    if tables.is_empty() {
        println!("No series matched the selection");
        return;
    }
    for (i, table) in tables.iter().enumerate() {
        println!(
            "{:>3}. {}  ({} observations)",
            i + 1,
            table.label(),
            table.observations().len()
        );
    }
    if !global.quiet {
        println!();
        println!("{} series", tables.len());
    }
}

/// Handle configuration management commands
pub async fn handle_config(args: ConfigArgs, config: &AppConfig, global: &GlobalArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            println!();
            println!("{}", get_credential_status().report());
        }
        ConfigAction::Path => match AppConfig::active_config_path(global.config.as_deref()) {
            Some(path) => println!("{}", path.display()),
            None => {
                println!("No configuration file found, using defaults");
                println!(
                    "Run 'sdmx_fetcher config init' to create {}",
                    AppConfig::get_default_config_path()?.display()
                );
            }
        },
        ConfigAction::Init { path, force } => {
            let path = AppConfig::initialize(path, force).await?;
            println!("Configuration file: {}", path.display());
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::generic(format!("Failed to encode JSON: {}", e)))
}
