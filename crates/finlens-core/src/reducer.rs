use serde_json::Value;

use super::actions::RuntimeAction;
use super::actions::ShellAction;
use super::actions::UserAction;
use super::error::ValidationError;
use super::forecast::merge_direction;
use super::forecast::ChartData;
use super::model::ForecastQuery;
use super::model::ForecastResponse;
use super::model::QueryRecord;
use super::render::render;
use super::render::to_plain_text;
use super::state::InputFocus;
use super::state::NoticeLevel;
use super::state::Route;
use super::state::ShellState;
use super::state::ThemeMode;
use super::tickers::parse_days;
use super::tickers::TICKERS;

pub const QUERY_SUCCESS_NOTICE: &str = "Analysis result fetched successfully!";
pub const QUERY_FAILURE_NOTICE: &str = "Error processing the query";
pub const HISTORY_FAILURE_NOTICE: &str = "Unable to fetch data";
pub const FORECAST_FAILURE_PREFIX: &str = "Error fetching forecast data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinEffect {
    RequestFrame,
    SubmitQuery { seq: u64, query: String },
    FetchHistory { seq: u64 },
    FetchForecast { seq: u64, query: ForecastQuery },
    PersistTheme(ThemeMode),
    CopyToClipboard(String),
}

pub fn reduce(state: &mut ShellState, action: ShellAction) -> Vec<FinEffect> {
    match action {
        ShellAction::User(user) => reduce_user(state, user),
        ShellAction::Runtime(runtime) => {
            reduce_runtime(state, runtime);
            Vec::new()
        }
    }
}

/// Effects owed by the initial route, as if the user had just navigated there.
pub fn start(state: &mut ShellState) -> Vec<FinEffect> {
    let mut effects = vec![FinEffect::RequestFrame];
    if state.route == Route::History {
        effects.push(begin_history_fetch(state));
    }
    effects
}

fn reduce_user(state: &mut ShellState, action: UserAction) -> Vec<FinEffect> {
    match action {
        UserAction::NextRoute => enter_route(state, state.route.next()),
        UserAction::PrevRoute => enter_route(state, state.route.prev()),
        UserAction::SelectRoute(route) => enter_route(state, route),
        UserAction::ToggleTheme => {
            let theme = state.customization.theme.toggle();
            state.customization.theme = theme;
            vec![FinEffect::PersistTheme(theme), FinEffect::RequestFrame]
        }
        UserAction::ToggleNav => {
            state.customization.show_nav = !state.customization.show_nav;
            vec![FinEffect::RequestFrame]
        }
        UserAction::FocusInput => {
            state.focus = match state.route {
                Route::Query => InputFocus::Query,
                Route::Forecast => InputFocus::Days,
                Route::History => InputFocus::None,
            };
            vec![FinEffect::RequestFrame]
        }
        UserAction::BlurInput => {
            state.focus = InputFocus::None;
            vec![FinEffect::RequestFrame]
        }
        UserAction::InputChar(ch) => {
            match focused_input(state) {
                Some(input) => input.push(ch),
                None => return Vec::new(),
            }
            vec![FinEffect::RequestFrame]
        }
        UserAction::InputBackspace => {
            match focused_input(state) {
                Some(input) => {
                    input.pop();
                }
                None => return Vec::new(),
            }
            vec![FinEffect::RequestFrame]
        }
        UserAction::InputPaste(text) => {
            let Some(input) = focused_input(state) else {
                return Vec::new();
            };
            // Single-line inputs: pasted line breaks become spaces.
            input.extend(text.chars().map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch }));
            vec![FinEffect::RequestFrame]
        }
        UserAction::SubmitQuery => submit_query(state),
        UserAction::CopyAnalysis => {
            let Some(value) = state.active_response() else {
                push_notice(state, NoticeLevel::Warning, "Nothing to copy yet.");
                return vec![FinEffect::RequestFrame];
            };
            let text = to_plain_text(&render(value));
            vec![FinEffect::CopyToClipboard(text), FinEffect::RequestFrame]
        }
        UserAction::RefreshHistory => vec![begin_history_fetch(state), FinEffect::RequestFrame],
        UserAction::HistoryCursorUp => {
            state.history.cursor = state.history.cursor.saturating_sub(1);
            vec![FinEffect::RequestFrame]
        }
        UserAction::HistoryCursorDown => {
            let last = state.history.records.len().saturating_sub(1);
            state.history.cursor = (state.history.cursor + 1).min(last);
            vec![FinEffect::RequestFrame]
        }
        UserAction::HistorySelectCursor => {
            let cursor = state.history.cursor;
            select_history_row(state, cursor)
        }
        UserAction::SelectHistoryRow(index) => select_history_row(state, index),
        UserAction::ClearHistorySelection => {
            state.history.selected = None;
            vec![FinEffect::RequestFrame]
        }
        UserAction::NextTicker => {
            state.forecast.ticker_index = (state.forecast.ticker_index + 1) % TICKERS.len();
            vec![FinEffect::RequestFrame]
        }
        UserAction::PrevTicker => {
            state.forecast.ticker_index =
                (state.forecast.ticker_index + TICKERS.len() - 1) % TICKERS.len();
            vec![FinEffect::RequestFrame]
        }
        UserAction::SubmitForecast => submit_forecast(state),
    }
}

fn reduce_runtime(state: &mut ShellState, action: RuntimeAction) {
    match action {
        RuntimeAction::QueryCompleted { seq, result } => apply_query_result(state, seq, result),
        RuntimeAction::HistoryLoaded { seq, result } => apply_history_result(state, seq, result),
        RuntimeAction::ForecastCompleted { seq, result } => {
            apply_forecast_result(state, seq, result)
        }
        RuntimeAction::PushNotice { level, message } => push_notice(state, level, message),
    }
}

fn enter_route(state: &mut ShellState, route: Route) -> Vec<FinEffect> {
    if state.route == route {
        return Vec::new();
    }
    tracing::debug!(from = state.route.label(), to = route.label(), "route change");
    state.route = route;
    state.focus = InputFocus::None;

    let mut effects = vec![FinEffect::RequestFrame];
    if route == Route::History {
        effects.push(begin_history_fetch(state));
    }
    effects
}

fn focused_input(state: &mut ShellState) -> Option<&mut String> {
    match state.focus {
        InputFocus::Query => Some(&mut state.query.input),
        InputFocus::Days => Some(&mut state.forecast.days_input),
        InputFocus::None => None,
    }
}

fn submit_query(state: &mut ShellState) -> Vec<FinEffect> {
    let query = state.query.input.clone();
    if query.trim().is_empty() {
        push_notice(
            state,
            NoticeLevel::Warning,
            ValidationError::EmptyQuery.to_string(),
        );
        return vec![FinEffect::RequestFrame];
    }

    state.query.analysis = None;
    state.query.last_submitted = Some(query.clone());
    let seq = state.query.request.begin();
    tracing::info!(seq, chars = query.len(), "submitting query");
    vec![FinEffect::SubmitQuery { seq, query }, FinEffect::RequestFrame]
}

fn apply_query_result(state: &mut ShellState, seq: u64, result: Result<Value, String>) {
    if !state.query.request.finish(seq) {
        tracing::debug!(seq, "discarding stale query response");
        return;
    }
    match result {
        Ok(data) => {
            state.query.analysis = Some(data);
            push_notice(state, NoticeLevel::Success, QUERY_SUCCESS_NOTICE);
        }
        Err(err) => {
            tracing::warn!(seq, error = %err, "query failed");
            state.query.analysis = None;
            push_notice(state, NoticeLevel::Error, QUERY_FAILURE_NOTICE);
        }
    }
}

fn begin_history_fetch(state: &mut ShellState) -> FinEffect {
    state.history.selected = None;
    let seq = state.history.request.begin();
    FinEffect::FetchHistory { seq }
}

fn apply_history_result(
    state: &mut ShellState,
    seq: u64,
    result: Result<Vec<QueryRecord>, String>,
) {
    if !state.history.request.finish(seq) {
        tracing::debug!(seq, "discarding stale history response");
        return;
    }
    state.history.selected = None;
    match result {
        Ok(records) => {
            tracing::debug!(seq, count = records.len(), "history loaded");
            let last = records.len().saturating_sub(1);
            state.history.cursor = state.history.cursor.min(last);
            state.history.records = records;
        }
        Err(err) => {
            tracing::warn!(seq, error = %err, "history fetch failed");
            state.history.records.clear();
            state.history.cursor = 0;
            push_notice(state, NoticeLevel::Error, HISTORY_FAILURE_NOTICE);
        }
    }
}

fn select_history_row(state: &mut ShellState, index: usize) -> Vec<FinEffect> {
    if index >= state.history.records.len() {
        return Vec::new();
    }
    state.history.cursor = index;
    state.history.selected = Some(index);
    vec![FinEffect::RequestFrame]
}

fn submit_forecast(state: &mut ShellState) -> Vec<FinEffect> {
    let days = match parse_days(&state.forecast.days_input) {
        Ok(days) => days,
        Err(err) => {
            push_notice(state, NoticeLevel::Warning, err.to_string());
            return vec![FinEffect::RequestFrame];
        }
    };

    let query = ForecastQuery::for_ticker(state.forecast.ticker(), days);
    state.forecast.chart = None;
    state.forecast.metrics = None;
    state.forecast.last_query = Some(query.clone());
    let seq = state.forecast.request.begin();
    tracing::info!(seq, ticker = %query.ticker, days, "requesting forecast");
    vec![FinEffect::FetchForecast { seq, query }, FinEffect::RequestFrame]
}

fn apply_forecast_result(
    state: &mut ShellState,
    seq: u64,
    result: Result<ForecastResponse, String>,
) {
    if !state.forecast.request.finish(seq) {
        tracing::debug!(seq, "discarding stale forecast response");
        return;
    }
    let outcome = result.and_then(|response| {
        let chart = ChartData::from_forecast(&response.forecast).map_err(|err| err.to_string())?;
        let mut metrics = response.metrics;
        merge_direction(&mut metrics, &response.forecast);
        Ok((chart, metrics))
    });
    match outcome {
        Ok((chart, metrics)) => {
            tracing::debug!(seq, points = chart.len(), "forecast applied");
            state.forecast.chart = Some(chart);
            state.forecast.metrics = Some(metrics);
        }
        Err(err) => {
            tracing::warn!(seq, error = %err, "forecast failed");
            state.forecast.chart = None;
            state.forecast.metrics = None;
            push_notice(
                state,
                NoticeLevel::Error,
                format!("{FORECAST_FAILURE_PREFIX}: {err}"),
            );
        }
    }
}

fn push_notice(state: &mut ShellState, level: NoticeLevel, message: impl Into<String>) {
    state.notices.push(level, message);
}

#[cfg(test)]
mod tests;
