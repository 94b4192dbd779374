use std::time::Duration;

use crate::retry::RetryDecision;
use crate::state::PendingStep;
use crate::{Effect, HarvestFailure, HarvestState, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current phase are ignored.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match (state.phase.clone(), msg) {
        (Phase::Idle, Msg::Start) => {
            state.phase = Phase::Authenticating;
            vec![Effect::Login]
        }
        (Phase::Authenticating, Msg::LoginSucceeded) => {
            state.phase = Phase::PageLoading;
            state.pending = PendingStep::Prepare;
            vec![pending_effect(&state.pending, Duration::ZERO)]
        }
        (Phase::Authenticating, Msg::LoginFailed { reason }) => {
            state.phase = Phase::Failed(HarvestFailure::Authentication { reason });
            Vec::new()
        }
        (Phase::PageLoading, Msg::PageReady(pagination)) => {
            let page = pagination.current_page;
            state.pagination = pagination;
            state.phase = Phase::Extracting;
            vec![Effect::Extract { page }]
        }
        (Phase::PageLoading, Msg::NoMorePages) => {
            state.pagination = std::mem::take(&mut state.pagination).into_exhausted();
            begin_export(&mut state)
        }
        (Phase::PageLoading | Phase::Extracting, Msg::StallDetected) => retry_or_fail(&mut state, None),
        (Phase::PageLoading | Phase::Extracting, Msg::NavigationFailed { message }) => {
            retry_or_fail(&mut state, Some(message))
        }
        (Phase::Extracting, Msg::PageExtracted { records, .. }) if records.is_empty() => {
            retry_or_fail(&mut state, None)
        }
        (Phase::Extracting, Msg::PageExtracted { records, .. }) => {
            state.result.push_page(records);
            state.failures = 0;
            match state.pagination.next_target(state.settings.max_pages) {
                Some(_) => {
                    state.phase = Phase::PageLoading;
                    state.pending = PendingStep::Advance(state.pagination.clone());
                    vec![pending_effect(&state.pending, Duration::ZERO)]
                }
                None => begin_export(&mut state),
            }
        }
        (Phase::Exporting, Msg::ExportCompleted { rows }) => {
            state.rows_exported = Some(rows);
            state.phase = Phase::Done;
            Vec::new()
        }
        (Phase::Exporting, Msg::ExportFailed { reason }) => {
            state.phase = Phase::Failed(HarvestFailure::Export { reason });
            Vec::new()
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn pending_effect(pending: &PendingStep, delay: Duration) -> Effect {
    match pending {
        PendingStep::Prepare => Effect::PreparePages { delay },
        PendingStep::Advance(from) => Effect::Advance {
            from: from.clone(),
            delay,
        },
    }
}

fn begin_export(state: &mut HarvestState) -> Vec<Effect> {
    state.phase = Phase::Exporting;
    vec![Effect::Export {
        result: std::mem::take(&mut state.result),
    }]
}

/// Re-run the pending step, or fail once the retry budget is spent.
/// `navigation_error` is `None` for stalls.
fn retry_or_fail(state: &mut HarvestState, navigation_error: Option<String>) -> Vec<Effect> {
    state.failures += 1;
    match state.settings.retry.decide(state.failures) {
        RetryDecision::Retry { delay, .. } => {
            state.phase = Phase::PageLoading;
            vec![pending_effect(&state.pending, delay)]
        }
        RetryDecision::GiveUp { attempts } => {
            let page = state.pending.target_page();
            let failure = match navigation_error {
                Some(message) => HarvestFailure::Navigation {
                    page,
                    attempts,
                    message,
                },
                None => HarvestFailure::Stalled { page, attempts },
            };
            state.phase = Phase::Failed(failure);
            Vec::new()
        }
    }
}
