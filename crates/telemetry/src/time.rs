// Path: crates/telemetry/src/time.rs
use crate::sinks::ServiceMetricsSink;
use std::time::Instant;

/// Observes the wall-clock duration of a scope via `Drop`, used to time
/// response-builder invocations (spec.md §4.7) without littering call sites
/// with manual `Instant::now()` bookkeeping.
pub struct BuildTimer<'a> {
    sink: &'a dyn ServiceMetricsSink,
    request_kind: &'static str,
    start: Instant,
}

impl<'a> BuildTimer<'a> {
    pub fn new(sink: &'a dyn ServiceMetricsSink, request_kind: &'static str) -> Self {
        Self {
            sink,
            request_kind,
            start: Instant::now(),
        }
    }
}

impl Drop for BuildTimer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_build_duration(self.request_kind, self.start.elapsed().as_secs_f64());
    }
}
