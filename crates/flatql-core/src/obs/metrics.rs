use serde::Serialize;
use std::{
    cell::RefCell,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for generator activity.
///

#[derive(Clone, Debug, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) errors: ErrorCounters,
    pub(crate) since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            errors: ErrorCounters::default(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Entrypoint
    pub generate_calls: u64,
    pub generate_failures: u64,

    // Schema cache
    pub cache_hits: u64,
    pub cache_misses: u64,

    // Sampling
    pub fetch_attempts: u64,
    pub fetch_failures: u64,
    pub documents_sampled: u64,
    pub documents_skipped: u64,

    // Output shape
    pub queries_compiled: u64,
    pub lateral_flattens: u64,
    pub ambiguous_fields: u64,
}

///
/// ErrorCounters
/// Failures by public error kind name.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ErrorCounters {
    pub by_kind: BTreeMap<String, u64>,
}

///
/// EventReport
/// Point-in-time snapshot returned to callers.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub errors: ErrorCounters,
    pub since_ms: u64,
}

thread_local! {
    static STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    STATE.with(|state| {
        let state = state.borrow();
        EventReport {
            ops: state.ops.clone(),
            errors: state.errors.clone(),
            since_ms: state.since_ms,
        }
    })
}

pub(crate) fn reset_all() {
    STATE.with(|state| *state.borrow_mut() = EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
