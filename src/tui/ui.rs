//! Rendering for the interactive browser

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::models::SeriesRow;
use crate::app::{CodelistRole, DataSource, TaskKind};
use crate::tui::app::{BrowseApp, DatabaseForm, InputMode, Pane};

const HELP: &str = "↑/↓ move  Tab pane  Enter choose/toggle  f fetch  n/p series  s CSV  d database  r reload  q quit";

/// Render the whole screen
pub fn render<S: DataSource>(f: &mut Frame, app: &BrowseApp<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Content
            Constraint::Length(7), // Status
            Constraint::Length(1), // Help
        ])
        .split(f.size());

    let title = match app.session().active_dataflow() {
        Some(dataflow) => format!(
            "SDMX Fetcher - {} ({})",
            dataflow.name, dataflow.key_family_id
        ),
        None => "SDMX Fetcher - IMF data service".to_string(),
    };
    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);
    render_dataflows(f, app, content[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(content[1]);
    render_codelists(f, app, right[0]);
    render_series(f, app, right[1]);

    render_status(f, app, chunks[2]);
    f.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );

    match app.mode() {
        InputMode::Normal => {}
        InputMode::CsvName(buffer) => render_csv_prompt(f, buffer),
        InputMode::Database(form) => render_database_prompt(f, form),
    }
}

fn pane_block<S: DataSource>(app: &BrowseApp<S>, pane: Pane, title: String) -> Block<'static> {
    let style = if app.focus() == pane && matches!(app.mode(), InputMode::Normal) {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_list(f: &mut Frame, items: Vec<ListItem<'_>>, block: Block<'_>, cursor: usize, area: Rect) {
    let selected = if items.is_empty() { None } else { Some(cursor) };
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_dataflows<S: DataSource>(f: &mut Frame, app: &BrowseApp<S>, area: Rect) {
    let session = app.session();
    let mut title = format!("Dataflows ({})", session.catalog().len());
    if session.is_loading(TaskKind::Catalog) {
        title.push_str(" loading...");
    }

    let items: Vec<ListItem> = session
        .catalog()
        .iter()
        .map(|dataflow| ListItem::new(dataflow.name.as_str()))
        .collect();
    let block = pane_block(app, Pane::Dataflows, title);
    render_list(f, items, block, app.cursor(Pane::Dataflows), area);
}

fn render_codelists<S: DataSource>(f: &mut Frame, app: &BrowseApp<S>, area: Rect) {
    let session = app.session();

    if session.active_dataflow().is_some()
        && !session.is_loading(TaskKind::Schema)
        && session.schema().map_or(true, |schema| schema.is_empty())
    {
        let empty = Paragraph::new("No data structures to display")
            .style(Style::default().fg(Color::Red))
            .block(Block::default().title("Codelists").borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(35),
            Constraint::Percentage(45),
        ])
        .split(area);

    for (role, column) in CodelistRole::ALL.into_iter().zip(columns.iter()) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(4)])
            .split(*column);

        let pane = Pane::Codes(role);
        let mut title = role.title().to_string();
        if session.is_loading(TaskKind::Schema) {
            title.push_str(" loading...");
        }

        let selection = session.selection();
        let items: Vec<ListItem> = session
            .codes(role)
            .iter()
            .map(|code| {
                let mark = if selection.contains(role, code) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {}", mark, code.label()))
            })
            .collect();
        render_list(f, items, pane_block(app, pane, title), app.cursor(pane), parts[0]);

        let summary = selection.summary(role);
        let summary = Paragraph::new(if summary.is_empty() {
            "(none)".to_string()
        } else {
            summary
        })
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Selected").borders(Borders::ALL))
        .style(Style::default().fg(Color::Green));
        f.render_widget(summary, parts[1]);
    }
}

fn render_series<S: DataSource>(f: &mut Frame, app: &BrowseApp<S>, area: Rect) {
    let session = app.session();
    let loading = if session.is_loading(TaskKind::Series) {
        " loading..."
    } else if app.is_exporting() {
        " writing to database..."
    } else {
        ""
    };

    let (title, rows): (String, Vec<Row>) = match (session.current(), session.browser().position()) {
        (Some(table), Some((cursor, len))) => (
            format!(
                "{}  {}/{}  {} rows{}",
                table.label(),
                cursor + 1,
                len,
                table.row_count(),
                loading
            ),
            table.rows().map(series_row).collect(),
        ),
        _ => (format!("Series{}", loading), Vec::new()),
    };

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(10)])
        .header(
            Row::new(vec!["timeperiod", "value"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::White));
    f.render_widget(table, area);
}

/// Row 0 holds the series key and is shown dimmed
fn series_row(row: SeriesRow<'_>) -> Row<'static> {
    match row {
        SeriesRow::Header(key) => Row::new(vec![
            "key".to_string(),
            format!("{} {} {}", key.frequency, key.area, key.indicator),
        ])
        .style(Style::default().fg(Color::DarkGray)),
        SeriesRow::Observation(o) => Row::new(vec![o.timeperiod.clone(), o.value.clone()]),
    }
}

fn render_status<S: DataSource>(f: &mut Frame, app: &BrowseApp<S>, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<ListItem> = app
        .status()
        .rev()
        .take(visible)
        .map(|line| {
            let color = if line.is_error { Color::Red } else { Color::Gray };
            ListItem::new(Line::from(vec![
                Span::styled(
                    line.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(line.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();
    lines.reverse();

    let list = List::new(lines).block(Block::default().title("Status").borders(Borders::ALL));
    f.render_widget(list, area);
}

/// Rectangle of the given size centred in `area`
fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_csv_prompt(f: &mut Frame, buffer: &str) {
    let area = centered(60, 5, f.size());
    let text = vec![
        Line::from(format!("{}_", buffer)),
        Line::from(Span::styled(
            "Enter to save (empty for a timestamped name), Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let prompt = Paragraph::new(text).block(
        Block::default()
            .title("CSV file name")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, area);
    f.render_widget(prompt, area);
}

fn render_database_prompt(f: &mut Frame, form: &DatabaseForm) {
    let area = centered(60, (DatabaseForm::LABELS.len() + 4) as u16, f.size());
    let mut lines: Vec<Line> = DatabaseForm::LABELS
        .iter()
        .zip(form.values.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            let shown = if DatabaseForm::is_password(i) {
                "*".repeat(value.chars().count())
            } else {
                value.clone()
            };
            let style = if i == form.focus {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let cursor = if i == form.focus { "_" } else { "" };
            Line::from(Span::styled(format!("{:<9} {}{}", label, shown, cursor), style))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab next field, Enter on Table to write, Esc to cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let prompt = Paragraph::new(lines).block(
        Block::default()
            .title("Export to SQL Server")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, area);
    f.render_widget(prompt, area);
}
