use std::collections::VecDeque;

use serde_json::Value;

use crate::config::Config;
use crate::forecast::ChartData;
use crate::model::ForecastMetrics;
use crate::model::ForecastQuery;
use crate::model::QueryRecord;
use crate::tickers::ticker_index;
use crate::tickers::Ticker;
use crate::tickers::TICKERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Query,
    History,
    Forecast,
}

impl Route {
    pub const ALL: [Route; 3] = [Self::Query, Self::History, Self::Forecast];

    pub fn next(self) -> Self {
        match self {
            Self::Query => Self::History,
            Self::History => Self::Forecast,
            Self::Forecast => Self::Query,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Query => Self::Forecast,
            Self::History => Self::Query,
            Self::Forecast => Self::History,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::History => "History",
            Self::Forecast => "Forecast",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Query => 0,
            Self::History => 1,
            Self::Forecast => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "query" | "home" => Some(Self::Query),
            "history" | "list" => Some(Self::History),
            "forecast" | "predict" => Some(Self::Forecast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NoticeBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<Notice>,
}

impl NoticeBuffer {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(Notice {
            seq,
            level,
            message: message.into(),
        });
        seq
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Sequence numbers for one panel's requests. Only the most recently issued
/// request is current; completions of earlier ones are stale.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    issued: u64,
    in_flight: Option<u64>,
}

impl RequestTracker {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.in_flight == Some(seq)
    }

    /// Closes `seq` if it is current; returns whether its result should apply.
    pub fn finish(&mut self, seq: u64) -> bool {
        if self.is_current(seq) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFocus {
    None,
    Query,
    Days,
}

#[derive(Debug, Clone, Default)]
pub struct QueryPanel {
    pub input: String,
    pub last_submitted: Option<String>,
    pub analysis: Option<Value>,
    pub request: RequestTracker,
}

impl QueryPanel {
    pub fn loading(&self) -> bool {
        self.request.loading()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryPanel {
    pub records: Vec<QueryRecord>,
    pub cursor: usize,
    pub selected: Option<usize>,
    pub request: RequestTracker,
}

impl HistoryPanel {
    pub fn loading(&self) -> bool {
        self.request.loading()
    }

    pub fn selected_record(&self) -> Option<&QueryRecord> {
        self.selected.and_then(|idx| self.records.get(idx))
    }
}

#[derive(Debug, Clone)]
pub struct ForecastPanel {
    pub ticker_index: usize,
    pub days_input: String,
    pub chart: Option<ChartData>,
    pub metrics: Option<ForecastMetrics>,
    pub last_query: Option<ForecastQuery>,
    pub request: RequestTracker,
}

impl ForecastPanel {
    pub fn new(default_ticker: &str, default_days: u64) -> Self {
        Self {
            ticker_index: ticker_index(default_ticker).unwrap_or(0),
            days_input: default_days.to_string(),
            chart: None,
            metrics: None,
            last_query: None,
            request: RequestTracker::default(),
        }
    }

    pub fn ticker(&self) -> &'static Ticker {
        &TICKERS[self.ticker_index % TICKERS.len()]
    }

    pub fn loading(&self) -> bool {
        self.request.loading()
    }
}

#[derive(Debug, Clone)]
pub struct ShellCustomization {
    pub theme: ThemeMode,
    pub show_nav: bool,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    pub api_base_url: String,
    pub route: Route,
    pub focus: InputFocus,
    pub customization: ShellCustomization,
    pub query: QueryPanel,
    pub history: HistoryPanel,
    pub forecast: ForecastPanel,
    pub notices: NoticeBuffer,
}

impl ShellState {
    pub fn new(config: &Config, theme: ThemeMode) -> Self {
        Self {
            api_base_url: config.api.base_url.clone(),
            route: Route::Query,
            focus: InputFocus::None,
            customization: ShellCustomization {
                theme,
                show_nav: config.ui.show_nav,
            },
            query: QueryPanel::default(),
            history: HistoryPanel::default(),
            forecast: ForecastPanel::new(
                &config.forecast.default_ticker,
                config.forecast.default_days,
            ),
            notices: NoticeBuffer::new(config.ui.notice_capacity),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.query.loading() || self.history.loading() || self.forecast.loading()
    }

    /// Response shown in the detail view of the active route, if any.
    pub fn active_response(&self) -> Option<&Value> {
        match self.route {
            Route::Query => self.query.analysis.as_ref(),
            Route::History => self.history.selected_record().map(|r| &r.ai_response),
            Route::Forecast => None,
        }
    }
}
