//! Counters and histograms for evalboard stages.
//!
//! Stages receive a [`MetricsRecorder`] at construction and record into it
//! silently at the call site. [`InMemoryMetrics`] keeps every series in
//! memory; call [`InMemoryMetrics::flush`] to emit current values as tracing
//! events (e.g. on daemon shutdown).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use parking_lot::Mutex;

/// Label pairs attached to a series, e.g. `[("result", "ok")]`.
pub type Labels<'a> = &'a [(&'a str, &'a str)];

/// Sink for stage metrics.
pub trait MetricsRecorder: Send + Sync + std::fmt::Debug {
    /// Add `value` to the counter identified by `name` and `labels`.
    fn add_counter(&self, name: &str, labels: Labels<'_>, value: f64);

    /// Record one observation into the histogram identified by `name` and `labels`.
    fn observe_histogram(&self, name: &str, labels: Labels<'_>, value: f64);
}

/// Count and sum of a histogram series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
}

/// Render `name{k1="v1",k2="v2"}` with labels sorted by key.
fn series_key(name: &str, labels: Labels<'_>) -> String {
    let mut sorted: Vec<_> = labels.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut key = name.to_string();
    if !sorted.is_empty() {
        key.push('{');
        for (i, (k, v)) in sorted.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            let _ = write!(key, "{k}=\"{v}\"");
        }
        key.push('}');
    }
    key
}

/// In-process recorder backing every series with a map entry.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<BTreeMap<String, f64>>,
    histograms: Mutex<BTreeMap<String, HistogramSnapshot>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, `0.0` when it was never touched.
    pub fn counter(&self, name: &str, labels: Labels<'_>) -> f64 {
        self.counters
            .lock()
            .get(&series_key(name, labels))
            .copied()
            .unwrap_or(0.0)
    }

    /// Current state of a histogram, if it has any observations.
    pub fn histogram(&self, name: &str, labels: Labels<'_>) -> Option<HistogramSnapshot> {
        self.histograms
            .lock()
            .get(&series_key(name, labels))
            .copied()
    }

    /// Emit every series as a `tracing::info!` event.
    ///
    /// Call this at natural boundaries (daemon shutdown, end of a test run)
    /// rather than on every increment.
    pub fn flush(&self) {
        let counters = self.counters.lock().clone();
        let histograms = self.histograms.lock().clone();
        tracing::info!(
            metric = "flush",
            counters = counters.len(),
            histograms = histograms.len(),
        );
        for (series, value) in &counters {
            tracing::info!(metric = %series, value = value);
        }
        for (series, h) in &histograms {
            tracing::info!(metric = %series, count = h.count, sum = h.sum);
        }
    }
}

impl MetricsRecorder for InMemoryMetrics {
    fn add_counter(&self, name: &str, labels: Labels<'_>, value: f64) {
        *self
            .counters
            .lock()
            .entry(series_key(name, labels))
            .or_insert(0.0) += value;
        tracing::trace!(metric = name, "counter incremented");
    }

    fn observe_histogram(&self, name: &str, labels: Labels<'_>, value: f64) {
        let mut histograms = self.histograms.lock();
        let h = histograms.entry(series_key(name, labels)).or_default();
        h.count += 1;
        h.sum += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_series() {
        let m = InMemoryMetrics::new();
        m.add_counter("runner_runs_total", &[("result", "ok")], 1.0);
        m.add_counter("runner_runs_total", &[("result", "ok")], 1.0);
        m.add_counter("runner_runs_total", &[("result", "ignored")], 1.0);

        assert_eq!(m.counter("runner_runs_total", &[("result", "ok")]), 2.0);
        assert_eq!(m.counter("runner_runs_total", &[("result", "ignored")]), 1.0);
        assert_eq!(m.counter("runner_runs_total", &[("result", "error")]), 0.0);
    }

    #[test]
    fn label_order_does_not_matter() {
        let m = InMemoryMetrics::new();
        m.add_counter("bus", &[("topic", "t"), ("handler", "h")], 1.0);
        assert_eq!(m.counter("bus", &[("handler", "h"), ("topic", "t")]), 1.0);
    }

    #[test]
    fn histogram_tracks_count_and_sum() {
        let m = InMemoryMetrics::new();
        m.observe_histogram("runner_duration_ms", &[], 3.0);
        m.observe_histogram("runner_duration_ms", &[], 5.0);
        assert_eq!(
            m.histogram("runner_duration_ms", &[]),
            Some(HistogramSnapshot { count: 2, sum: 8.0 })
        );
    }

    #[test]
    fn series_key_format() {
        assert_eq!(series_key("plain", &[]), "plain");
        assert_eq!(
            series_key("x", &[("b", "2"), ("a", "1")]),
            "x{a=\"1\",b=\"2\"}"
        );
    }
}
