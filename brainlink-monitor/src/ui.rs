//! Operator dashboard
//!
//! A ratatui terminal UI owning all displayed state. Runs a blocking
//! poll/draw loop on its own thread; other components reach it only
//! through the [`DisplayEvent`] channel, and the UI reaches the rest of
//! the application only through [`AppCommand`]s.
//!
//! Keys: Up/Down select a port, Enter connects/disconnects, `r` rescans
//! the port list, `q` quits.

use std::io;
use std::time::Duration;

use brainlink_core::{
    ConnectionState, Reading, TransportState, METRIC_NAMES, WS_BIND_ADDR, WS_PATH,
};
use brainlink_hardware::available_ports;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::display::DisplayEvent;

/// UI-originated requests, executed by the controller task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Open the named serial port and start reading
    Connect(String),
    /// Stop the reader and close the port
    Disconnect,
    /// Shut the application down
    Quit,
}

/// Poll interval of the dashboard loop
const TICK: Duration = Duration::from_millis(100);

/// All state the dashboard renders
struct App {
    reading: Reading,
    frames: u64,
    serial: ConnectionState,
    transport: TransportState,
    alert: Option<String>,
    ports: Vec<String>,
    selection: ListState,
}

impl App {
    fn new() -> Self {
        let ports = available_ports();
        let mut selection = ListState::default();
        if !ports.is_empty() {
            selection.select(Some(0));
        }
        Self {
            reading: Reading::default(),
            frames: 0,
            serial: ConnectionState::Disconnected,
            transport: TransportState::NoClient,
            alert: None,
            ports,
            selection,
        }
    }

    fn apply(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::Reading(reading) => {
                self.reading = reading;
                self.frames += 1;
            }
            DisplayEvent::SerialStatus(state) => {
                self.serial = state;
                if state == ConnectionState::Connected {
                    self.alert = None;
                }
            }
            DisplayEvent::TransportStatus(state) => self.transport = state,
            DisplayEvent::Alert(message) => self.alert = Some(message),
        }
    }

    fn rescan(&mut self) {
        self.ports = available_ports();
        match self.ports.len() {
            0 => self.selection.select(None),
            n => {
                let keep = self.selection.selected().filter(|&i| i < n).unwrap_or(0);
                self.selection.select(Some(keep));
            }
        }
    }

    fn select_previous(&mut self) {
        if let Some(i) = self.selection.selected() {
            self.selection.select(Some(i.saturating_sub(1)));
        }
    }

    fn select_next(&mut self) {
        if let Some(i) = self.selection.selected() {
            if i + 1 < self.ports.len() {
                self.selection.select(Some(i + 1));
            }
        }
    }

    fn selected_port(&self) -> Option<String> {
        self.selection
            .selected()
            .and_then(|i| self.ports.get(i).cloned())
    }
}

/// Run the dashboard until the operator quits.
///
/// Takes over the terminal for its lifetime; all errors restore the
/// terminal before propagating.
pub fn run_dashboard(
    events: mpsc::UnboundedReceiver<DisplayEvent>,
    commands: mpsc::UnboundedSender<AppCommand>,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, events, &commands);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Whatever happened in the loop, tell the controller to wind down
    let _ = commands.send(AppCommand::Quit);

    res
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut events: mpsc::UnboundedReceiver<DisplayEvent>,
    commands: &mpsc::UnboundedSender<AppCommand>,
) -> io::Result<()> {
    let mut app = App::new();

    loop {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        terminal.draw(|f| draw(f, &mut app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('r') => app.rescan(),
                    KeyCode::Up => app.select_previous(),
                    KeyCode::Down => app.select_next(),
                    KeyCode::Enter => {
                        if app.serial == ConnectionState::Connected {
                            let _ = commands.send(AppCommand::Disconnect);
                        } else if let Some(port) = app.selected_port() {
                            app.alert = None;
                            let _ = commands.send(AppCommand::Connect(port));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(7),
            Constraint::Min(13),
            Constraint::Length(3),
        ])
        .split(f.size());

    let status_style = |connected: bool| {
        if connected {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        }
    };

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("Serial: "),
            Span::styled(
                app.serial.as_str(),
                status_style(app.serial == ConnectionState::Connected),
            ),
            Span::raw(format!("   Frames: {}", app.frames)),
        ]),
        Line::from(vec![
            Span::raw(format!("WebSocket ws://{}{}: ", WS_BIND_ADDR, WS_PATH)),
            Span::styled(
                app.transport.as_str(),
                status_style(app.transport == TransportState::ClientAttached),
            ),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("BrainLink EEG Monitor"),
    );
    f.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = if app.ports.is_empty() {
        vec![ListItem::new("no serial ports found (press r to rescan)")]
    } else {
        app.ports
            .iter()
            .map(|p| ListItem::new(p.as_str()))
            .collect()
    };
    let ports = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Port"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
        .highlight_symbol("> ");
    f.render_stateful_widget(ports, chunks[1], &mut app.selection);

    let values = app.reading.values();
    let rows: Vec<Row> = METRIC_NAMES
        .iter()
        .zip(values.iter())
        .map(|(name, value)| Row::new(vec![name.to_string(), value.to_string()]))
        .collect();
    let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title("EEG Values"));
    f.render_widget(table, chunks[2]);

    let footer = match &app.alert {
        Some(message) => Paragraph::new(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Paragraph::new("↑/↓ select port   Enter connect/disconnect   r rescan   q quit"),
    }
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}
