//! Timing of response computations.
//!
//! Spans are reported at `trace` level under the `profiling` target, together
//! with the number of frequency bins they covered.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SpanTimer {
    label: &'static str,
    start: Instant,
    bins: usize,
    finished: bool,
}

impl SpanTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            bins: 0,
            finished: false,
        }
    }

    /// Number of frequency bins evaluated inside the span.
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Average time per bin, zero when no bins were recorded.
    pub fn per_bin(&self, elapsed: Duration) -> Duration {
        match u32::try_from(self.bins) {
            Ok(0) => Duration::ZERO,
            Ok(bins) => elapsed / bins,
            Err(_) => elapsed / u32::MAX,
        }
    }

    /// Ends the span and reports it.
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        self.report(elapsed, false);
        elapsed
    }

    fn report(&self, elapsed: Duration, abandoned: bool) {
        tracing::trace!(
            target: "profiling",
            label = self.label,
            bins = self.bins,
            elapsed = ?elapsed,
            per_bin = ?self.per_bin(elapsed),
            abandoned
        );
    }
}

impl Drop for SpanTimer {
    // A span dropped without `finish` belongs to a computation that was
    // cancelled or panicked.
    fn drop(&mut self) {
        if !self.finished {
            self.report(self.start.elapsed(), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_bin_divides_evenly() {
        let timer = SpanTimer::new("test").with_bins(4);
        assert_eq!(timer.per_bin(Duration::from_micros(100)), Duration::from_micros(25));
        let empty = SpanTimer::new("empty");
        assert_eq!(empty.per_bin(Duration::from_millis(3)), Duration::ZERO);
    }

    #[test]
    fn finish_reports_elapsed_time() {
        let timer = SpanTimer::new("test").with_bins(512);
        let before = timer.elapsed();
        assert!(timer.finish() >= before);
    }
}
