//! Metrics sink boundary.
//!
//! Stage logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    GenerateStart,
    GenerateFinish {
        ok: bool,
        micros: u64,
    },
    GenerateFailed {
        kind: &'static str,
    },
    CacheHit,
    CacheMiss,
    FetchAttempt,
    FetchFailed,
    DocumentsSampled {
        count: u64,
    },
    DocumentSkipped,
    Compiled {
        flattens: u64,
        ambiguous_fields: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread's metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::GenerateStart => {
                m.ops.generate_calls = m.ops.generate_calls.saturating_add(1);
            }
            MetricsEvent::GenerateFinish { ok, .. } => {
                if !ok {
                    m.ops.generate_failures = m.ops.generate_failures.saturating_add(1);
                }
            }
            MetricsEvent::GenerateFailed { kind } => {
                let entry = m.errors.by_kind.entry(kind.to_string()).or_default();
                *entry = entry.saturating_add(1);
            }
            MetricsEvent::CacheHit => m.ops.cache_hits = m.ops.cache_hits.saturating_add(1),
            MetricsEvent::CacheMiss => m.ops.cache_misses = m.ops.cache_misses.saturating_add(1),
            MetricsEvent::FetchAttempt => {
                m.ops.fetch_attempts = m.ops.fetch_attempts.saturating_add(1);
            }
            MetricsEvent::FetchFailed => {
                m.ops.fetch_failures = m.ops.fetch_failures.saturating_add(1);
            }
            MetricsEvent::DocumentsSampled { count } => {
                m.ops.documents_sampled = m.ops.documents_sampled.saturating_add(count);
            }
            MetricsEvent::DocumentSkipped => {
                m.ops.documents_skipped = m.ops.documents_skipped.saturating_add(1);
            }
            MetricsEvent::Compiled {
                flattens,
                ambiguous_fields,
            } => {
                m.ops.queries_compiled = m.ops.queries_compiled.saturating_add(1);
                m.ops.lateral_flattens = m.ops.lateral_flattens.saturating_add(flattens);
                m.ops.ambiguous_fields = m.ops.ambiguous_fields.saturating_add(ambiguous_fields);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state for the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// Span
/// RAII guard that emits start/finish events for one generator call.
/// Finish accounting happens even on unwind.
///

pub(crate) struct Span {
    start: Instant,
    ok: bool,
}

impl Span {
    #[must_use]
    pub(crate) fn new() -> Self {
        record(MetricsEvent::GenerateStart);

        Self {
            start: Instant::now(),
            ok: false,
        }
    }

    pub(crate) const fn succeed(&mut self) {
        self.ok = true;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        record(MetricsEvent::GenerateFinish {
            ok: self.ok,
            micros,
        });
    }
}
