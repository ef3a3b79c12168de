use super::*;
use pretty_assertions::assert_eq;

fn enter_history(state: &mut ShellState) -> u64 {
    let effects = run_user(state, UserAction::SelectRoute(Route::History));
    effects
        .iter()
        .find_map(|effect| match effect {
            FinEffect::FetchHistory { seq } => Some(*seq),
            _ => None,
        })
        .expect("history fetch on mount")
}

fn loaded_state() -> ShellState {
    let mut state = state();
    let seq = enter_history(&mut state);
    run_runtime(
        &mut state,
        RuntimeAction::HistoryLoaded {
            seq,
            result: Ok(sample_records()),
        },
    );
    state
}

#[test]
fn entering_history_fetches_every_time() {
    let mut state = state();
    let first = enter_history(&mut state);
    assert!(state.history.loading());

    run_user(&mut state, UserAction::SelectRoute(Route::Query));
    let second = enter_history(&mut state);
    assert!(second > first);

    // Re-selecting the active route is not a remount.
    assert!(run_user(&mut state, UserAction::SelectRoute(Route::History)).is_empty());
}

#[test]
fn startup_on_history_route_fetches() {
    let mut state = state();
    assert_eq!(start(&mut state), vec![FinEffect::RequestFrame]);

    state.route = Route::History;
    assert_eq!(
        start(&mut state),
        vec![FinEffect::RequestFrame, FinEffect::FetchHistory { seq: 1 }]
    );
}

#[test]
fn loaded_records_start_unselected() {
    let state = loaded_state();
    assert!(!state.history.loading());
    assert_eq!(state.history.records.len(), 3);
    assert_eq!(state.history.selected, None);
    assert_eq!(state.active_response(), None);
}

#[test]
fn cursor_moves_without_selecting() {
    let mut state = loaded_state();
    run_user(&mut state, UserAction::HistoryCursorDown);
    run_user(&mut state, UserAction::HistoryCursorDown);
    run_user(&mut state, UserAction::HistoryCursorDown);
    assert_eq!(state.history.cursor, 2);
    assert_eq!(state.history.selected, None);

    run_user(&mut state, UserAction::HistoryCursorUp);
    run_user(&mut state, UserAction::HistorySelectCursor);
    assert_eq!(state.history.selected, Some(1));
    assert_eq!(state.active_response(), Some(&json!({ "winner": "TCS" })));
}

#[test]
fn selecting_a_row_switches_detail_and_clearing_restores_placeholder() {
    let mut state = loaded_state();
    run_user(&mut state, UserAction::SelectHistoryRow(0));
    assert_eq!(
        state.history.selected_record().map(|r| r.id.to_string()),
        Some("1".to_string())
    );

    run_user(&mut state, UserAction::SelectHistoryRow(2));
    assert_eq!(
        state.active_response(),
        Some(&json!(["maybe", "watch NPAs"]))
    );
    assert_eq!(state.history.cursor, 2);

    run_user(&mut state, UserAction::ClearHistorySelection);
    assert_eq!(state.history.selected_record(), None);
}

#[test]
fn out_of_range_selection_is_ignored() {
    let mut state = loaded_state();
    run_user(&mut state, UserAction::SelectHistoryRow(1));
    assert!(run_user(&mut state, UserAction::SelectHistoryRow(9)).is_empty());
    assert_eq!(state.history.selected, Some(1));
}

#[test]
fn failed_fetch_empties_list_and_selection() {
    let mut state = loaded_state();
    run_user(&mut state, UserAction::SelectHistoryRow(1));

    let effects = run_user(&mut state, UserAction::RefreshHistory);
    let seq = match effects.first() {
        Some(FinEffect::FetchHistory { seq }) => *seq,
        other => panic!("expected history fetch, got {other:?}"),
    };
    run_runtime(
        &mut state,
        RuntimeAction::HistoryLoaded {
            seq,
            result: Err("503 Service Unavailable".to_string()),
        },
    );

    assert!(state.history.records.is_empty());
    assert_eq!(state.history.selected, None);
    assert!(!state.history.loading());
    assert_eq!(
        latest_notice(&state),
        Some((NoticeLevel::Error, HISTORY_FAILURE_NOTICE.to_string()))
    );
}

#[test]
fn stale_history_response_is_dropped() {
    let mut state = state();
    let first = enter_history(&mut state);
    let effects = run_user(&mut state, UserAction::RefreshHistory);
    assert_eq!(effects.first(), Some(&FinEffect::FetchHistory { seq: first + 1 }));

    run_runtime(
        &mut state,
        RuntimeAction::HistoryLoaded {
            seq: first,
            result: Ok(sample_records()),
        },
    );
    assert!(state.history.records.is_empty());
    assert!(state.history.loading());
}

#[test]
fn left_route_still_receives_its_result() {
    let mut state = state();
    let seq = enter_history(&mut state);
    run_user(&mut state, UserAction::SelectRoute(Route::Forecast));

    run_runtime(
        &mut state,
        RuntimeAction::HistoryLoaded {
            seq,
            result: Ok(sample_records()),
        },
    );
    assert_eq!(state.history.records.len(), 3);
}
