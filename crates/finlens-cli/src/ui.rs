use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use chrono::NaiveDate;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Terminal;

use finlens_api::FinancialApi;
use finlens_core::actions::{RuntimeAction, ShellAction, UserAction};
use finlens_core::forecast::{ChartData, SeriesField};
use finlens_core::history::preview;
use finlens_core::history::truncate_words;
use finlens_core::persistence::ThemeStore;
use finlens_core::reducer::{reduce, start, FinEffect};
use finlens_core::render::{render, ViewNode};
use finlens_core::state::{InputFocus, NoticeLevel, Route, ShellState, ThemeMode};

use crate::report::{metric_cards, MetricCard, Tone};

const NO_PROMPT: &str = "No prompt entered yet.";
const NO_ANALYSIS: &str = "No analysis generated yet.";
const NO_SELECTION: &str = "Select a record to view AI analysis";
const NO_FORECAST: &str = "Pick a ticker and day count, then press Enter.";

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            LeaveAlternateScreen,
            crossterm::cursor::Show
        );
    }
}

pub fn run(
    mut state: ShellState,
    api: Arc<dyn FinancialApi>,
    theme_store: Option<ThemeStore>,
    tick_ms: u64,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard; // Restores the terminal on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = EffectRunner::new(api, theme_store);
    run_app(&mut terminal, &mut state, &runner, Duration::from_millis(tick_ms.max(1)))
}

/// Executes reducer effects. Requests run on worker threads and report back
/// through the channel; everything else happens on the UI thread.
struct EffectRunner {
    api: Arc<dyn FinancialApi>,
    theme_store: Option<ThemeStore>,
    tx: mpsc::Sender<RuntimeAction>,
    rx: mpsc::Receiver<RuntimeAction>,
}

impl EffectRunner {
    fn new(api: Arc<dyn FinancialApi>, theme_store: Option<ThemeStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            theme_store,
            tx,
            rx,
        }
    }

    fn run(&self, state: &mut ShellState, effects: Vec<FinEffect>) {
        for effect in effects {
            match effect {
                FinEffect::RequestFrame => {}
                FinEffect::SubmitQuery { seq, query } => {
                    self.spawn(move |api| RuntimeAction::QueryCompleted {
                        seq,
                        result: api.submit_query(&query).map_err(|err| err.to_string()),
                    });
                }
                FinEffect::FetchHistory { seq } => {
                    self.spawn(move |api| RuntimeAction::HistoryLoaded {
                        seq,
                        result: api.fetch_history().map_err(|err| err.to_string()),
                    });
                }
                FinEffect::FetchForecast { seq, query } => {
                    self.spawn(move |api| RuntimeAction::ForecastCompleted {
                        seq,
                        result: api.fetch_forecast(&query).map_err(|err| err.to_string()),
                    });
                }
                FinEffect::PersistTheme(mode) => self.persist_theme(state, mode),
                FinEffect::CopyToClipboard(text) => {
                    let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(text));
                    let (level, message) = match copied {
                        Ok(()) => (NoticeLevel::Success, "Copied analysis to clipboard.".to_string()),
                        Err(err) => {
                            tracing::warn!(error = %err, "clipboard unavailable");
                            (NoticeLevel::Warning, format!("Clipboard unavailable: {err}"))
                        }
                    };
                    reduce(
                        state,
                        ShellAction::Runtime(RuntimeAction::PushNotice { level, message }),
                    );
                }
            }
        }
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn FinancialApi) -> RuntimeAction + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(job(api.as_ref()));
        });
    }

    fn persist_theme(&self, state: &mut ShellState, mode: ThemeMode) {
        let Some(store) = &self.theme_store else {
            return;
        };
        if let Err(err) = store.save(mode) {
            tracing::warn!(path = %store.path().display(), error = %err, "theme not saved");
            reduce(
                state,
                ShellAction::Runtime(RuntimeAction::PushNotice {
                    level: NoticeLevel::Warning,
                    message: format!("Theme not saved: {err}"),
                }),
            );
        }
    }

    fn drain(&self, state: &mut ShellState) {
        while let Ok(action) = self.rx.try_recv() {
            reduce(state, ShellAction::Runtime(action));
        }
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    accent_alt: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    text: Color,
    panel_bg: Color,
    selected_bg: Color,
    open: Color,
    high: Color,
    close: Color,
}

fn palette_for(theme: ThemeMode) -> UiPalette {
    match theme {
        ThemeMode::Dark => UiPalette {
            accent: Color::Cyan,
            accent_alt: Color::LightBlue,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::DarkGray,
            border: Color::Gray,
            text: Color::White,
            panel_bg: Color::Black,
            selected_bg: Color::Rgb(18, 28, 42),
            open: Color::LightGreen,
            high: Color::LightBlue,
            close: Color::LightRed,
        },
        ThemeMode::Light => UiPalette {
            accent: Color::Blue,
            accent_alt: Color::Magenta,
            success: Color::Green,
            warning: Color::Rgb(160, 100, 0),
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::DarkGray,
            text: Color::Black,
            panel_bg: Color::White,
            selected_bg: Color::Rgb(215, 228, 245),
            open: Color::Green,
            high: Color::Blue,
            close: Color::Red,
        },
    }
}

fn series_color(field: SeriesField, palette: UiPalette) -> Color {
    match field {
        SeriesField::Open => palette.open,
        SeriesField::High => palette.high,
        SeriesField::Close => palette.close,
    }
}

fn tone_color(tone: Tone, palette: UiPalette) -> Color {
    match tone {
        Tone::Neutral => palette.text,
        Tone::Positive => palette.success,
        Tone::Negative => palette.danger,
    }
}

enum KeyHandlerResult {
    Continue(Vec<FinEffect>),
    Exit,
}

fn user(state: &mut ShellState, action: UserAction) -> Vec<FinEffect> {
    reduce(state, ShellAction::User(action))
}

fn handle_input_keys(key: event::KeyEvent, state: &mut ShellState) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Esc => user(state, UserAction::BlurInput),
        KeyCode::Enter => match state.focus {
            InputFocus::Query => user(state, UserAction::SubmitQuery),
            InputFocus::Days => user(state, UserAction::SubmitForecast),
            InputFocus::None => Vec::new(),
        },
        KeyCode::Backspace => user(state, UserAction::InputBackspace),
        KeyCode::Char(c) => user(state, UserAction::InputChar(c)),
        _ => Vec::new(),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_route_keys(key: event::KeyEvent, state: &mut ShellState) -> Vec<FinEffect> {
    match (state.route, key.code) {
        (Route::Query, KeyCode::Enter) => user(state, UserAction::FocusInput),
        (Route::History, KeyCode::Up | KeyCode::Char('k')) => {
            user(state, UserAction::HistoryCursorUp)
        }
        (Route::History, KeyCode::Down | KeyCode::Char('j')) => {
            user(state, UserAction::HistoryCursorDown)
        }
        (Route::History, KeyCode::Enter | KeyCode::Char(' ')) => {
            user(state, UserAction::HistorySelectCursor)
        }
        (Route::History, KeyCode::Esc) => user(state, UserAction::ClearHistorySelection),
        (Route::History, KeyCode::Char('r')) => user(state, UserAction::RefreshHistory),
        (Route::Forecast, KeyCode::Left | KeyCode::Up | KeyCode::Char('h')) => {
            user(state, UserAction::PrevTicker)
        }
        (Route::Forecast, KeyCode::Right | KeyCode::Down | KeyCode::Char('l')) => {
            user(state, UserAction::NextTicker)
        }
        (Route::Forecast, KeyCode::Enter | KeyCode::Char('s')) => {
            user(state, UserAction::SubmitForecast)
        }
        _ => Vec::new(),
    }
}

fn handle_global_keys(key: event::KeyEvent, state: &mut ShellState) -> KeyHandlerResult {
    let effects = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Tab => user(state, UserAction::NextRoute),
        KeyCode::BackTab => user(state, UserAction::PrevRoute),
        KeyCode::Char(c @ '1'..='3') => {
            let index = c as usize - '1' as usize;
            match Route::from_index(index) {
                Some(route) => user(state, UserAction::SelectRoute(route)),
                None => Vec::new(),
            }
        }
        KeyCode::Char('b') => user(state, UserAction::ToggleNav),
        KeyCode::Char('i') => user(state, UserAction::FocusInput),
        KeyCode::Char('y') => user(state, UserAction::CopyAnalysis),
        _ => handle_route_keys(key, state),
    };
    KeyHandlerResult::Continue(effects)
}

fn handle_key_event(key: event::KeyEvent, state: &mut ShellState) -> KeyHandlerResult {
    if key.kind != KeyEventKind::Press {
        return KeyHandlerResult::Continue(Vec::new());
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => KeyHandlerResult::Exit,
            KeyCode::Char('t') => KeyHandlerResult::Continue(user(state, UserAction::ToggleTheme)),
            _ => KeyHandlerResult::Continue(Vec::new()),
        };
    }
    if state.focus != InputFocus::None {
        handle_input_keys(key, state)
    } else {
        handle_global_keys(key, state)
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut ShellState,
    runner: &EffectRunner,
    tick: Duration,
) -> io::Result<()> {
    let effects = start(state);
    runner.run(state, effects);

    loop {
        runner.drain(state);
        terminal.draw(|f| ui(f, state))?;

        if event::poll(tick)? {
            let effects = match event::read()? {
                Event::Key(key) => match handle_key_event(key, state) {
                    KeyHandlerResult::Continue(effects) => effects,
                    KeyHandlerResult::Exit => {
                        tracing::info!("dashboard closed");
                        return Ok(());
                    }
                },
                Event::Paste(text) => user(state, UserAction::InputPaste(text)),
                _ => Vec::new(),
            };
            runner.run(state, effects);
        }
    }
}

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    frames[(millis / 100) as usize % frames.len()]
}

fn panel_block(title: impl Into<String>, palette: UiPalette, focused: bool) -> Block<'static> {
    let border = if focused { palette.accent } else { palette.border };
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .style(Style::default().bg(palette.panel_bg).fg(palette.text))
        .border_style(Style::default().fg(border))
}

fn placeholder(text: &str, palette: UiPalette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(palette.muted),
    ))
}

/// Styled rows for a rendered JSON view.
fn view_lines(node: &ViewNode, palette: UiPalette) -> Vec<Line<'static>> {
    node.lines()
        .into_iter()
        .map(|line| {
            let mut spans = vec![Span::raw("  ".repeat(line.depth))];
            if line.bullet {
                spans.push(Span::styled("• ", Style::default().fg(palette.accent_alt)));
            }
            if let Some(label) = line.label {
                let suffix = if line.text.is_empty() { ":" } else { ": " };
                spans.push(Span::styled(
                    format!("{label}{suffix}"),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::raw(line.text));
            Line::from(spans)
        })
        .collect()
}

/// `2024-06-03` becomes `03 Jun`; anything else is shown as-is.
fn short_date(label: &str) -> String {
    NaiveDate::parse_from_str(label, "%Y-%m-%d")
        .map(|date| date.format("%d %b").to_string())
        .unwrap_or_else(|_| label.to_string())
}

fn ui(f: &mut ratatui::Frame, state: &ShellState) {
    let palette = palette_for(state.customization.theme);
    f.render_widget(
        Block::default().style(Style::default().bg(palette.panel_bg).fg(palette.text)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state, palette);

    let titles: Vec<Line> = Route::ALL
        .iter()
        .map(|route| Line::from(format!("{} {}", route.index() + 1, route.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(panel_block("Views", palette, false))
        .select(state.route.index())
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[1]);

    let mut main_area = chunks[2];
    if state.customization.show_nav {
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(22), Constraint::Min(0)])
            .split(chunks[2]);
        render_nav_rail(f, sections[0], state, palette);
        main_area = sections[1];
    }

    match state.route {
        Route::Query => render_query(f, main_area, state, palette),
        Route::History => render_history(f, main_area, state, palette),
        Route::Forecast => render_forecast(f, main_area, state, palette),
    }

    render_footer(f, chunks[3], state, palette);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let activity = if state.is_loading() {
        format!("{} loading", get_spinner())
    } else {
        "idle".to_string()
    };
    let header_text = format!(
        "FinLens | {} | Theme:{} | API:{} | {}",
        state.route.label(),
        state.customization.theme.label(),
        state.api_base_url,
        activity
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(palette.accent))
        .block(panel_block("", palette, false));
    f.render_widget(header, area);
}

fn render_nav_rail(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let mut lines = vec![Line::from("")];
    for route in Route::ALL {
        let (marker, color) = if route == state.route {
            ("➤", palette.accent)
        } else {
            ("○", palette.muted)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} "), Style::default().fg(color)),
            Span::styled(
                format!("{} {}", route.index() + 1, route.label()),
                Style::default().fg(color),
            ),
        ]));
    }
    lines.push(Line::from(""));
    for hint in ["Tab   next view", "i     edit input", "Esc   leave input", "y     copy", "C-t   theme", "b     hide rail"] {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(palette.muted))));
    }

    let p = Paragraph::new(lines)
        .block(panel_block("Navigate", palette, false))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn input_line(value: &str, focused: bool, palette: UiPalette) -> Line<'static> {
    let mut spans = vec![Span::raw(value.to_string())];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(palette.accent)));
    }
    Line::from(spans)
}

fn render_query(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let focused = state.focus == InputFocus::Query;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

    let input_title = if focused {
        "Prompt (Enter send, Esc done)"
    } else {
        "Prompt (i or Enter to type)"
    };
    let input = Paragraph::new(input_line(&state.query.input, focused, palette))
        .block(panel_block(input_title, palette, focused));
    f.render_widget(input, sections[0]);

    let prompt = if state.query.input.is_empty() {
        placeholder(NO_PROMPT, palette)
    } else {
        Line::from(state.query.input.clone())
    };
    let prompt = Paragraph::new(prompt)
        .block(panel_block("User Entered Prompt", palette, false))
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, sections[1]);

    let (title, lines) = if state.query.loading() {
        (
            format!("Analysis | {} analysing", get_spinner()),
            vec![placeholder("Waiting for the backend...", palette)],
        )
    } else {
        let lines = match &state.query.analysis {
            Some(value) => {
                let node = render(value);
                if node.is_empty() {
                    vec![placeholder(NO_ANALYSIS, palette)]
                } else {
                    view_lines(&node, palette)
                }
            }
            None => vec![placeholder(NO_ANALYSIS, palette)],
        };
        let title = match &state.query.last_submitted {
            Some(prompt) => format!("Analysis of \"{}\" (y copy)", truncate_words(prompt, 8)),
            None => "Analysis (y copy)".to_string(),
        };
        (title, lines)
    };
    let analysis = Paragraph::new(lines)
        .block(panel_block(title, palette, false))
        .wrap(Wrap { trim: false });
    f.render_widget(analysis, sections[2]);
}

fn render_history(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let sections = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let title = if state.history.loading() {
        format!("History | {} loading", get_spinner())
    } else {
        format!("History ({} records, r refresh)", state.history.records.len())
    };
    let rows: Vec<Row> = state
        .history
        .records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let radio = if state.history.selected == Some(idx) {
                "(•)"
            } else {
                "( )"
            };
            Row::new(vec![
                radio.to_string(),
                record.id.to_string(),
                preview(&record.user_query),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["", "ID", "User Query"])
            .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block(title, palette, false))
    .row_highlight_style(Style::default().bg(palette.selected_bg));
    let mut table_state = TableState::default();
    if !state.history.records.is_empty() {
        table_state.select(Some(state.history.cursor));
    }
    f.render_stateful_widget(table, sections[0], &mut table_state);

    let (title, lines) = match state.history.selected_record() {
        Some(record) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(
                        "User Query: ",
                        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(record.user_query.clone()),
                ]),
                Line::from(""),
            ];
            let node = render(&record.ai_response);
            if node.is_empty() {
                lines.push(placeholder(NO_ANALYSIS, palette));
            } else {
                lines.extend(view_lines(&node, palette));
            }
            (format!("AI Analysis #{} (Esc clear, y copy)", record.id), lines)
        }
        None => ("AI Analysis".to_string(), vec![placeholder(NO_SELECTION, palette)]),
    };
    let detail = Paragraph::new(lines)
        .block(panel_block(title, palette, false))
        .wrap(Wrap { trim: false });
    f.render_widget(detail, sections[1]);
}

fn render_forecast(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let show_cards = state.forecast.metrics.is_some() && !state.forecast.loading();
    let cards_h = if show_cards { 9 } else { 0 };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(cards_h),
            Constraint::Min(0),
        ])
        .split(area);

    let focused = state.focus == InputFocus::Days;
    let ticker = state.forecast.ticker();
    let mut controls = vec![
        Span::styled("Ticker ", Style::default().fg(palette.muted)),
        Span::styled("◀ ", Style::default().fg(palette.accent)),
        Span::styled(
            ticker.symbol,
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ({})", ticker.name)),
        Span::styled(" ▶", Style::default().fg(palette.accent)),
        Span::styled("   Days ", Style::default().fg(palette.muted)),
    ];
    controls.extend(input_line(&state.forecast.days_input, focused, palette).spans);
    let controls = Paragraph::new(Line::from(controls)).block(panel_block(
        "Forecast (←/→ ticker, i edit days, Enter submit)",
        palette,
        focused,
    ));
    f.render_widget(controls, sections[0]);

    if let (true, Some(metrics)) = (show_cards, &state.forecast.metrics) {
        render_metric_cards(f, sections[1], &metric_cards(metrics), palette);
    }

    if state.forecast.loading() {
        let p = Paragraph::new(placeholder("Fetching forecast...", palette))
            .block(panel_block(format!("Price Forecast | {}", get_spinner()), palette, false));
        f.render_widget(p, sections[2]);
        return;
    }
    match &state.forecast.chart {
        Some(chart) if !chart.is_empty() => {
            let title = match &state.forecast.last_query {
                Some(query) => format!(
                    "Price Forecast: {} ({}), {} days",
                    query.company, query.ticker, chart.len()
                ),
                None => format!("Price Forecast ({} days)", chart.len()),
            };
            render_chart(f, sections[2], title, chart, palette)
        }
        _ => {
            let p = Paragraph::new(placeholder(NO_FORECAST, palette))
                .block(panel_block("Price Forecast", palette, false));
            f.render_widget(p, sections[2]);
        }
    }
}

fn render_metric_cards(
    f: &mut ratatui::Frame,
    area: Rect,
    cards: &[MetricCard],
    palette: UiPalette,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(5)])
        .split(area);

    // Sentiment and its reason share the first row; the rest split the second.
    let (first, rest) = cards.split_at(cards.len().min(2));
    let first_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(rows[0]);
    for (card, col) in first.iter().zip(first_cols.iter()) {
        render_card(f, *col, card, palette);
    }

    if rest.is_empty() {
        return;
    }
    let share = 100 / rest.len() as u16;
    let rest_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(share); rest.len()])
        .split(rows[1]);
    for (card, col) in rest.iter().zip(rest_cols.iter()) {
        render_card(f, *col, card, palette);
    }
}

fn render_card(f: &mut ratatui::Frame, area: Rect, card: &MetricCard, palette: UiPalette) {
    let lines: Vec<Line> = card
        .lines
        .iter()
        .map(|line| {
            Line::from(Span::styled(
                line.text.clone(),
                Style::default().fg(tone_color(line.tone, palette)),
            ))
        })
        .collect();
    let p = Paragraph::new(lines)
        .block(panel_block(card.title, palette, false))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn render_chart(
    f: &mut ratatui::Frame,
    area: Rect,
    title: String,
    chart: &ChartData,
    palette: UiPalette,
) {
    let points: Vec<(SeriesField, Vec<(f64, f64)>)> = chart
        .series
        .iter()
        .map(|series| {
            let data = series
                .points
                .iter()
                .enumerate()
                .map(|(i, &price)| (i as f64, price))
                .collect();
            (series.field, data)
        })
        .collect();
    let datasets: Vec<Dataset> = points
        .iter()
        .map(|(field, data)| {
            Dataset::default()
                .name(field.label())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(*field, palette)))
                .data(data)
        })
        .collect();

    let (min_y, max_y) = chart.bounds().unwrap_or((0.0, 1.0));
    let pad = ((max_y - min_y) * 0.02).max(0.5);
    let (min_y, max_y) = (min_y - pad, max_y + pad);
    let max_x = chart.len().saturating_sub(1).max(1) as f64;

    let mut x_labels = Vec::new();
    if let Some(first) = chart.labels.first() {
        x_labels.push(Span::raw(short_date(first)));
    }
    if chart.len() > 2 {
        x_labels.push(Span::raw(short_date(&chart.labels[chart.len() / 2])));
    }
    if let (Some(last), true) = (chart.labels.last(), chart.len() > 1) {
        x_labels.push(Span::raw(short_date(last)));
    }

    let widget = Chart::new(datasets)
        .block(panel_block(title, palette, false))
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(palette.muted))
                .bounds([0.0, max_x])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Price")
                .style(Style::default().fg(palette.muted))
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(format!("{min_y:.1}")),
                    Span::raw(format!("{:.1}", (min_y + max_y) / 2.0)),
                    Span::raw(format!("{max_y:.1}")),
                ]),
        );
    f.render_widget(widget, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, state: &ShellState, palette: UiPalette) {
    let mut spans = Vec::new();
    if let Some(notice) = state.notices.latest() {
        let color = match notice.level {
            NoticeLevel::Success => palette.success,
            NoticeLevel::Warning => palette.warning,
            NoticeLevel::Error => palette.danger,
        };
        spans.push(Span::styled(
            format!("[{}] ", notice.level.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(notice.message.clone(), Style::default().fg(color)));
        spans.push(Span::styled("  |  ", Style::default().fg(palette.muted)));
    }
    let hint = if state.focus == InputFocus::None {
        "q quit"
    } else {
        "Esc leave input"
    };
    spans.push(Span::styled(hint, Style::default().fg(palette.muted)));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use finlens_core::config::Config;
    use finlens_core::model::QueryRecord;
    use finlens_core::model::RecordId;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    use super::*;

    fn state() -> ShellState {
        ShellState::new(&Config::default(), ThemeMode::Dark)
    }

    fn press(code: KeyCode) -> event::KeyEvent {
        event::KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn draw(state: &ShellState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");
        terminal.draw(|f| ui(f, state)).expect("draw");
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn q_quits_only_without_focus() {
        let mut state = state();
        run_key(&mut state, KeyCode::Char('i'));
        assert_eq!(state.focus, InputFocus::Query);
        assert!(matches!(
            handle_key_event(press(KeyCode::Char('q')), &mut state),
            KeyHandlerResult::Continue(_)
        ));
        assert_eq!(state.query.input, "q");

        run_key(&mut state, KeyCode::Esc);
        assert!(matches!(
            handle_key_event(press(KeyCode::Char('q')), &mut state),
            KeyHandlerResult::Exit
        ));
    }

    fn run_key(state: &mut ShellState, code: KeyCode) -> Vec<FinEffect> {
        match handle_key_event(press(code), state) {
            KeyHandlerResult::Continue(effects) => effects,
            KeyHandlerResult::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn number_keys_jump_and_history_fetches() {
        let mut state = state();
        let effects = run_key(&mut state, KeyCode::Char('2'));
        assert_eq!(state.route, Route::History);
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, FinEffect::FetchHistory { .. })));

        run_key(&mut state, KeyCode::Char('3'));
        assert_eq!(state.route, Route::Forecast);
        run_key(&mut state, KeyCode::BackTab);
        assert_eq!(state.route, Route::History);
    }

    #[test]
    fn enter_in_prompt_submits() {
        let mut state = state();
        run_key(&mut state, KeyCode::Enter);
        assert_eq!(state.focus, InputFocus::Query);
        for ch in "hi".chars() {
            run_key(&mut state, KeyCode::Char(ch));
        }
        let effects = run_key(&mut state, KeyCode::Enter);
        assert!(effects.contains(&FinEffect::SubmitQuery {
            seq: 1,
            query: "hi".to_string(),
        }));
    }

    #[test]
    fn ctrl_t_toggles_theme_even_while_typing() {
        let mut state = state();
        run_key(&mut state, KeyCode::Char('i'));
        let key = event::KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL);
        match handle_key_event(key, &mut state) {
            KeyHandlerResult::Continue(effects) => {
                assert!(effects.contains(&FinEffect::PersistTheme(ThemeMode::Light)))
            }
            KeyHandlerResult::Exit => panic!("unexpected exit"),
        }
        assert_eq!(state.query.input, "");
    }

    #[test]
    fn view_lines_indent_and_bullet() {
        let node = render(&json!({ "outlook": { "risks": ["fx", "rates"] } }));
        let text: Vec<String> = view_lines(&node, palette_for(ThemeMode::Dark))
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(
            text,
            vec!["Outlook:", "  Risks:", "    • fx", "    • rates"]
        );
    }

    #[test]
    fn dates_are_shortened_for_axis_labels() {
        assert_eq!(short_date("2024-06-03"), "03 Jun");
        assert_eq!(short_date("week 23"), "week 23");
    }

    #[test]
    fn placeholders_render_when_panels_are_empty() {
        let mut state = state();
        let screen = draw(&state);
        assert!(screen.contains(NO_PROMPT));
        assert!(screen.contains(NO_ANALYSIS));

        state.route = Route::History;
        state.history.records = vec![QueryRecord {
            id: RecordId::Number(5),
            user_query: "Why did SBIN fall?".to_string(),
            ai_response: json!({ "cause": "provisioning" }),
        }];
        let screen = draw(&state);
        assert!(screen.contains(NO_SELECTION));
        assert!(screen.contains("Why did SBIN fall?"));

        state.history.selected = Some(0);
        let screen = draw(&state);
        assert!(screen.contains("Cause: provisioning"));
        assert!(screen.contains("(•)"));
    }

    #[test]
    fn forecast_view_draws_cards_and_chart() {
        let mut state = state();
        state.route = Route::Forecast;
        assert!(draw(&state).contains(NO_FORECAST));

        let response: finlens_core::model::ForecastResponse = serde_json::from_value(json!({
            "forecast": {
                "Open": { "2024-06-03": 10.0, "2024-06-04": 11.0, "2024-06-05": 12.0 },
                "High": { "2024-06-03": 11.0, "2024-06-04": 12.0, "2024-06-05": 13.0 },
                "Close": { "2024-06-03": 10.5, "2024-06-04": 11.5, "2024-06-05": 11.0 }
            },
            "metrics": { "accuracy": 70, "news_sentiment": { "sentiment": "neutral", "confidence": 0.4 } }
        }))
        .expect("fixture");
        state.forecast.chart = Some(ChartData::from_forecast(&response.forecast).expect("chart"));
        state.forecast.metrics = Some(response.metrics);

        let screen = draw(&state);
        assert!(screen.contains("Model Accuracy"));
        assert!(screen.contains("Accuracy: 70%"));
        assert!(screen.contains("Price Forecast (3 days)"));
        assert!(screen.contains("03 Jun"));

        state.forecast.last_query = Some(finlens_core::model::ForecastQuery::for_ticker(
            state.forecast.ticker(),
            3,
        ));
        assert!(draw(&state).contains("Price Forecast: Reliance Industries (RELIANCE.NS), 3 days"));
    }

    #[test]
    fn analysis_title_names_the_submitted_prompt() {
        let mut state = state();
        state.query.last_submitted = Some("Is HDFC Bank a buy after the merger?".to_string());
        state.query.analysis = Some(json!({ "verdict": "hold" }));
        let screen = draw(&state);
        assert!(screen.contains("Analysis of \"Is HDFC Bank a buy after the merger?\""));
        assert!(screen.contains("Verdict: hold"));
    }

    #[test]
    fn footer_shows_latest_notice() {
        let mut state = state();
        state.notices.push(NoticeLevel::Error, "Unable to fetch data");
        assert!(draw(&state).contains("[error] Unable to fetch data"));
    }
}
