//! Interactive terminal browser
//!
//! Dataflows on the left, the three codelists with their selections on the
//! right and the fetched series underneath. Remote calls run on the
//! [`TaskQueue`](crate::app::TaskQueue) and database exports on their own
//! task; this loop is the only place their results are applied, and it never
//! waits on network I/O itself.

pub mod app;
pub mod ui;

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::app::{Completion, SdmxClient, Session};
use crate::config::AppConfig;
use crate::constants::tui::TICK_RATE;
use crate::errors::Result;

pub use app::{BrowseApp, Command, DatabaseExport, DatabaseForm, InputMode, Pane};

type Backend = CrosstermBackend<Stdout>;

/// Run the browser until the user quits
pub async fn run(client: SdmxClient, config: &AppConfig) -> Result<()> {
    let (session, mut completions) = Session::new(Arc::new(client));
    let (mut app, mut exports) = BrowseApp::new(
        session,
        config.export.clone(),
        config.database.to_runtime_config(),
    );
    app.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("Browser started");

    let result = event_loop(&mut terminal, &mut app, &mut completions, &mut exports).await;

    // Restore the terminal even when the loop failed
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = terminal.backend_mut().execute(LeaveAlternateScreen) {
        warn!("Failed to leave alternate screen: {}", e);
    }
    terminal.show_cursor()?;
    info!("Browser closed");

    result
}

/// Redraw, then wait for whichever comes first: a key, a task completion,
/// a finished export or the next tick
async fn event_loop(
    terminal: &mut Terminal<Backend>,
    app: &mut BrowseApp<SdmxClient>,
    completions: &mut UnboundedReceiver<Completion>,
    exports: &mut UnboundedReceiver<DatabaseExport>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK_RATE);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            Some(completion) = completions.recv() => app.apply(completion),
            Some(export) = exports.recv() => app.apply_export(export),
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match app.handle_key(key) {
                        None => {}
                        Some(Command::Quit) => return Ok(()),
                        Some(Command::ExportCsv { name }) => app.export_csv(&name),
                        Some(Command::ExportDatabase { info, table }) => {
                            app.export_database(info, table)
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            _ = tick.tick() => {}
        }
    }
}
