use serde_json::json;
use serde_json::Value;

pub(super) use super::reduce;
pub(super) use super::start;
pub(super) use super::FORECAST_FAILURE_PREFIX;
pub(super) use super::HISTORY_FAILURE_NOTICE;
pub(super) use super::QUERY_FAILURE_NOTICE;
pub(super) use super::QUERY_SUCCESS_NOTICE;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::ShellAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Config;
pub(super) use crate::model::ForecastResponse;
pub(super) use crate::model::QueryRecord;
pub(super) use crate::model::RecordId;
pub(super) use crate::reducer::FinEffect;
pub(super) use crate::state::InputFocus;
pub(super) use crate::state::NoticeBuffer;
pub(super) use crate::state::NoticeLevel;
pub(super) use crate::state::Route;
pub(super) use crate::state::ShellState;
pub(super) use crate::state::ThemeMode;

mod history_panel;

fn state() -> ShellState {
    ShellState::new(&Config::default(), ThemeMode::Dark)
}

fn run_user(state: &mut ShellState, action: UserAction) -> Vec<FinEffect> {
    reduce(state, ShellAction::User(action))
}

fn run_runtime(state: &mut ShellState, action: RuntimeAction) {
    let effects = reduce(state, ShellAction::Runtime(action));
    assert!(effects.is_empty());
}

fn type_text(state: &mut ShellState, text: &str) {
    for ch in text.chars() {
        run_user(state, UserAction::InputChar(ch));
    }
}

fn latest_notice(state: &ShellState) -> Option<(NoticeLevel, String)> {
    state
        .notices
        .latest()
        .map(|notice| (notice.level, notice.message.clone()))
}

fn record(id: i64, query: &str, response: Value) -> QueryRecord {
    QueryRecord {
        id: RecordId::Number(id),
        user_query: query.to_string(),
        ai_response: response,
    }
}

fn sample_records() -> Vec<QueryRecord> {
    vec![
        record(1, "How is Reliance doing?", json!({ "summary": "steady" })),
        record(2, "Compare TCS and Infosys", json!({ "winner": "TCS" })),
        record(3, "Is SBI undervalued?", json!(["maybe", "watch NPAs"])),
    ]
}

fn forecast_response(value: Value) -> ForecastResponse {
    serde_json::from_value(value).expect("forecast fixture")
}

fn sample_forecast() -> ForecastResponse {
    forecast_response(json!({
        "forecast": {
            "Open": { "2024-06-03": 10.0, "2024-06-04": 11.0, "2024-06-05": 12.0 },
            "High": { "2024-06-03": 11.0, "2024-06-04": 12.5, "2024-06-05": 12.4 },
            "Close": { "2024-06-03": 10.0, "2024-06-04": 12.0, "2024-06-05": 11.0 }
        },
        "metrics": {
            "accuracy": 71.5,
            "forecast_trend": { "up_days": 1, "total_days": 2 }
        }
    }))
}
