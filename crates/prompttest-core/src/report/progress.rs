//! Progress reporting. The runner emits done/total in completion order; the
//! console layer consumes via a sink.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One progress update: how many tests are done and total count.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. The runner calls this each time a test
/// completes. Implementations may throttle.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Format a single progress line for display. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running test {}/{}...", done, total)
}

/// Minimum interval between progress updates to avoid log spam.
const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

/// For large runs, emit at most every this many tests.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

struct ThrottleState {
    last_emit: Option<Instant>,
}

/// Returns a throttled progress sink printing to stderr. None for runs of
/// 0 or 1 tests; always emits on done == total.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let step = progress_step(total);
    let state = Arc::new(Mutex::new(ThrottleState { last_emit: None }));
    Some(Arc::new(move |ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        let now = Instant::now();
        let should_emit = {
            let mut g = state.lock().expect("progress throttle lock");
            let emit_final = ev.done == ev.total;
            let emit_step = ev.done % step == 0 || ev.done == 1;
            let interval_ok = g
                .last_emit
                .map(|t| {
                    now.saturating_duration_since(t)
                        >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
                })
                .unwrap_or(true);
            let ok = emit_final || (emit_step && interval_ok);
            if ok {
                g.last_emit = Some(now);
            }
            ok
        };
        if should_emit {
            eprintln!("{}", format_progress_line(ev.done, ev.total));
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::{default_progress_sink, format_progress_line, progress_step};

    #[test]
    fn format_progress_line_contains_done_and_total() {
        let s = format_progress_line(3, 10);
        assert!(s.contains("3/10"), "expected '3/10' in {:?}", s);
    }

    #[test]
    fn default_progress_sink_none_for_total_0_or_1() {
        assert!(default_progress_sink(0).is_none());
        assert!(default_progress_sink(1).is_none());
    }

    #[test]
    fn progress_step_logic() {
        assert_eq!(progress_step(5), 1);
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(25), 2);
        assert_eq!(progress_step(100), 10);
    }
}
