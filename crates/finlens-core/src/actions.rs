use serde_json::Value;

use super::model::ForecastResponse;
use super::model::QueryRecord;
use super::state::NoticeLevel;
use super::state::Route;

#[derive(Debug, Clone)]
pub enum ShellAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    NextRoute,
    PrevRoute,
    SelectRoute(Route),
    ToggleTheme,
    ToggleNav,
    FocusInput,
    BlurInput,
    InputChar(char),
    InputBackspace,
    InputPaste(String),
    SubmitQuery,
    CopyAnalysis,
    RefreshHistory,
    HistoryCursorUp,
    HistoryCursorDown,
    HistorySelectCursor,
    SelectHistoryRow(usize),
    ClearHistorySelection,
    NextTicker,
    PrevTicker,
    SubmitForecast,
}

/// Outcomes reported back by the effect runner. Errors arrive already
/// formatted since they only ever reach a notice or a log line.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    QueryCompleted {
        seq: u64,
        result: Result<Value, String>,
    },
    HistoryLoaded {
        seq: u64,
        result: Result<Vec<QueryRecord>, String>,
    },
    ForecastCompleted {
        seq: u64,
        result: Result<ForecastResponse, String>,
    },
    PushNotice {
        level: NoticeLevel,
        message: String,
    },
}
