//! Interactive browser state and key handling
//!
//! [`BrowseApp`] owns the [`Session`] and everything the screen needs that is
//! not session state: focused pane, list cursors, text prompts and the status
//! log. Key handling is synchronous; work it triggers is returned as a
//! [`Command`] for the event loop to run. Database exports run on their own
//! task and report back as a [`DatabaseExport`] on the receiver returned by
//! [`BrowseApp::new`].

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;

use crate::app::{
    csv_destination, export_to_file, export_to_sql_server, Completion, ConnectionInfo, DataSource,
    ExportSummary, Session, SessionUpdate,
};
use crate::app::models::CodelistRole;
use crate::config::ExportConfigToml;
use crate::constants::tui::MAX_STATUS_MESSAGES;
use crate::errors::ExportResult;

/// Focusable list panes, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Dataflows,
    Codes(CodelistRole),
}

impl Pane {
    const ORDER: [Pane; 4] = [
        Pane::Dataflows,
        Pane::Codes(CodelistRole::Frequency),
        Pane::Codes(CodelistRole::Area),
        Pane::Codes(CodelistRole::Indicator),
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Fields of the database export prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseForm {
    pub values: [String; 6],
    pub focus: usize,
}

impl DatabaseForm {
    pub const LABELS: [&'static str; 6] = ["Host", "Port", "User", "Password", "Database", "Table"];
    const PASSWORD: usize = 3;

    pub fn new(defaults: &ConnectionInfo) -> Self {
        Self {
            values: [
                defaults.host.clone(),
                defaults.port.to_string(),
                defaults.user.clone(),
                defaults.password.clone(),
                defaults.database.clone(),
                String::new(),
            ],
            focus: 0,
        }
    }

    pub fn is_password(index: usize) -> bool {
        index == Self::PASSWORD
    }

    fn is_last(&self) -> bool {
        self.focus + 1 == self.values.len()
    }

    /// Connection and table name entered in the form
    pub fn to_request(&self, defaults: &ConnectionInfo) -> Result<(ConnectionInfo, String), String> {
        let port = self.values[1]
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("Invalid port '{}'", self.values[1].trim()))?;
        let info = ConnectionInfo {
            host: self.values[0].trim().to_string(),
            port,
            user: self.values[2].trim().to_string(),
            password: self.values[3].clone(),
            database: self.values[4].trim().to_string(),
            ..defaults.clone()
        };
        crate::auth::require_complete(&info).map_err(|e| e.to_string())?;
        Ok((info, self.values[5].trim().to_string()))
    }
}

/// Text prompt currently shown, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    CsvName(String),
    Database(DatabaseForm),
}

/// Work the event loop must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    ExportCsv { name: String },
    ExportDatabase { info: ConnectionInfo, table: String },
}

/// Outcome of a background database export
#[derive(Debug)]
pub struct DatabaseExport {
    pub table: String,
    pub result: ExportResult<ExportSummary>,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub at: DateTime<Local>,
    pub text: String,
    pub is_error: bool,
}

pub struct BrowseApp<S: DataSource> {
    session: Session<S>,
    focus: Pane,
    dataflow_cursor: usize,
    code_cursors: [usize; 3],
    mode: InputMode,
    status: VecDeque<StatusLine>,
    export: ExportConfigToml,
    connection: ConnectionInfo,
    exports: mpsc::UnboundedSender<DatabaseExport>,
    exporting: bool,
}

impl<S: DataSource> BrowseApp<S> {
    pub fn new(
        session: Session<S>,
        export: ExportConfigToml,
        connection: ConnectionInfo,
    ) -> (Self, mpsc::UnboundedReceiver<DatabaseExport>) {
        let (exports, receiver) = mpsc::unbounded_channel();
        let app = Self {
            session,
            focus: Pane::Dataflows,
            dataflow_cursor: 0,
            code_cursors: [0; 3],
            mode: InputMode::Normal,
            status: VecDeque::new(),
            export,
            connection,
            exports,
            exporting: false,
        };
        (app, receiver)
    }

    /// Kick off the catalog request
    pub fn start(&mut self) {
        self.session.load_catalog();
        self.info("Loading dataflows...");
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn status(&self) -> impl DoubleEndedIterator<Item = &StatusLine> {
        self.status.iter()
    }

    pub fn cursor(&self, pane: Pane) -> usize {
        match pane {
            Pane::Dataflows => self.dataflow_cursor,
            Pane::Codes(role) => self.code_cursors[role.index()],
        }
    }

    fn push_status(&mut self, text: String, is_error: bool) {
        if self.status.len() == MAX_STATUS_MESSAGES {
            self.status.pop_front();
        }
        self.status.push_back(StatusLine {
            at: Local::now(),
            text,
            is_error,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push_status(text.into(), false);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push_status(text.into(), true);
    }

    fn pane_len(&self, pane: Pane) -> usize {
        match pane {
            Pane::Dataflows => self.session.catalog().len(),
            Pane::Codes(role) => self.session.codes(role).len(),
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.pane_len(self.focus);
        let cursor = match self.focus {
            Pane::Dataflows => &mut self.dataflow_cursor,
            Pane::Codes(role) => &mut self.code_cursors[role.index()],
        };
        if down {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    /// Apply a completion drained from the session's receiver
    pub fn apply(&mut self, completion: Completion) {
        match self.session.apply(completion) {
            SessionUpdate::CatalogLoaded { count } => {
                self.dataflow_cursor = self.dataflow_cursor.min(count.saturating_sub(1));
                self.info(format!("Loaded {} dataflows", count));
            }
            SessionUpdate::SchemaLoaded {
                key_family_id,
                empty,
            } => {
                self.code_cursors = [0; 3];
                if empty {
                    self.error("No data structures to display");
                } else {
                    self.info(format!("Loaded codelists for {}", key_family_id));
                }
            }
            SessionUpdate::SeriesLoaded { count } => {
                if count == 0 {
                    self.info("No series matched the selection");
                } else {
                    self.info(format!("Fetched {} series", count));
                }
            }
            SessionUpdate::Failed { kind, error } => {
                self.error(format!("Loading {} failed ({}): {}", kind, error.kind(), error));
            }
            SessionUpdate::Stale { kind } => {
                tracing::debug!("Ignored superseded {} result", kind);
            }
        }
    }

    /// Handle one key press
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match std::mem::replace(&mut self.mode, InputMode::Normal) {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::CsvName(buffer) => self.handle_csv_key(key, buffer),
            InputMode::Database(form) => self.handle_database_key(key, form),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Enter => self.choose(),
            KeyCode::Char('f') => match self.session.request_series() {
                Ok(_) => self.info("Fetching series..."),
                Err(e) => self.error(e.to_string()),
            },
            KeyCode::Char('n') => {
                self.session.next();
            }
            KeyCode::Char('p') => {
                self.session.previous();
            }
            KeyCode::Char('r') => self.start(),
            KeyCode::Char('s') => {
                if self.session.current().is_some() {
                    self.mode = InputMode::CsvName(String::new());
                } else {
                    self.error("No data to export");
                }
            }
            KeyCode::Char('d') => {
                if self.session.current().is_some() {
                    let defaults = crate::auth::apply_environment(self.connection.clone());
                    self.mode = InputMode::Database(DatabaseForm::new(&defaults));
                } else {
                    self.error("No data to export");
                }
            }
            _ => {}
        }
        None
    }

    fn choose(&mut self) {
        match self.focus {
            Pane::Dataflows => match self.session.select_dataflow(self.dataflow_cursor) {
                Ok(_) => {
                    self.code_cursors = [0; 3];
                    if let Some(dataflow) = self.session.active_dataflow() {
                        let message = format!("Loading codelists for {}...", dataflow.name);
                        self.info(message);
                    }
                }
                Err(e) => self.error(e.to_string()),
            },
            Pane::Codes(role) => {
                let index = self.code_cursors[role.index()];
                let toggled = self.session.toggle(role, index).map(|_| ());
                if let Err(e) = toggled {
                    self.error(e.to_string());
                }
            }
        }
    }

    fn handle_csv_key(&mut self, key: KeyEvent, mut buffer: String) -> Option<Command> {
        match key.code {
            KeyCode::Esc => {
                self.info("Export cancelled");
                return None;
            }
            KeyCode::Enter => return Some(Command::ExportCsv { name: buffer }),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
        self.mode = InputMode::CsvName(buffer);
        None
    }

    fn handle_database_key(&mut self, key: KeyEvent, mut form: DatabaseForm) -> Option<Command> {
        match key.code {
            KeyCode::Esc => {
                self.info("Export cancelled");
                return None;
            }
            KeyCode::Enter if form.is_last() => {
                return match form.to_request(&self.connection) {
                    Ok((info, table)) => Some(Command::ExportDatabase { info, table }),
                    Err(e) => {
                        self.error(e);
                        self.mode = InputMode::Database(form);
                        None
                    }
                };
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => {
                form.focus = (form.focus + 1) % form.values.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = (form.focus + form.values.len() - 1) % form.values.len();
            }
            KeyCode::Backspace => {
                form.values[form.focus].pop();
            }
            KeyCode::Char(c) => form.values[form.focus].push(c),
            _ => {}
        }
        self.mode = InputMode::Database(form);
        None
    }

    /// Write the current series to `<output dir>/<name>.csv`
    pub fn export_csv(&mut self, name: &str) {
        let path = csv_destination(&self.export.output_dir(), Some(name), &self.export.file_prefix);
        match export_to_file(self.session.current(), &path) {
            Ok(summary) => self.info(format!(
                "Saved {} rows to {}",
                summary.rows, summary.destination
            )),
            Err(e) => self.error(format!("Export failed ({}): {}", e.kind(), e)),
        }
    }

    /// Start replacing `table` in the database with the current series
    ///
    /// The export runs on its own task; its outcome arrives on the receiver
    /// returned by [`BrowseApp::new`] and is applied with
    /// [`apply_export`](Self::apply_export).
    pub fn export_database(&mut self, info: ConnectionInfo, table: String) {
        if self.exporting {
            self.error("A database export is already running");
            return;
        }
        let Some(series) = self.session.current().cloned() else {
            self.error("No data to export");
            return;
        };

        self.info(format!(
            "Writing table {} to {}:{}...",
            table, info.host, info.port
        ));
        self.exporting = true;
        let sender = self.exports.clone();
        tokio::spawn(async move {
            let result = export_to_sql_server(Some(&series), &info, &table).await;
            if sender.send(DatabaseExport { table, result }).is_err() {
                tracing::debug!("Browser closed before the database export finished");
            }
        });
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Report a finished database export
    pub fn apply_export(&mut self, export: DatabaseExport) {
        self.exporting = false;
        match export.result {
            Ok(summary) => self.info(format!(
                "Saved {} rows to table {}",
                summary.rows, summary.destination
            )),
            Err(e) => self.error(format!(
                "Database export to {} failed ({}): {}",
                export.table,
                e.kind(),
                e
            )),
        }
    }
}
