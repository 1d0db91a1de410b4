//! Prometheus handlers.
//!
//! Label values are derived from the hook by a caller-supplied function.
//! Returning `None` skips the hook, which lets one handler ignore the
//! operations it does not care about.

use hookwire_core::{Handler, Hook, keys};
use prometheus::{HistogramVec, IntCounterVec};
use std::{fmt, sync::Arc};

/// Derives label values from a hook; `None` skips it.
pub type LabelFn = Arc<dyn Fn(&Hook) -> Option<Vec<String>> + Send + Sync>;

/// Pre-handler that counts operations.
#[derive(Clone)]
pub struct CounterHandler {
    counter: IntCounterVec,
    labels: LabelFn,
}

impl CounterHandler {
    /// Increment `counter` with the labels derived from each hook.
    pub fn new<F>(counter: IntCounterVec, labels: F) -> Self
    where
        F: Fn(&Hook) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            counter,
            labels: Arc::new(labels),
        }
    }
}

impl Handler for CounterHandler {
    fn handle(&self, hook: &mut Hook) {
        let Some(labels) = (self.labels)(hook) else {
            return;
        };
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        match self.counter.get_metric_with_label_values(&labels) {
            Ok(counter) => counter.inc(),
            Err(err) => tracing::warn!(error = %err, "counter labels rejected"),
        }
    }
}

/// Post-handler that observes operation durations, in seconds.
#[derive(Clone)]
pub struct SummaryHandler {
    histogram: HistogramVec,
    labels: LabelFn,
}

impl SummaryHandler {
    /// Observe the `duration` argument on `histogram`.
    pub fn new<F>(histogram: HistogramVec, labels: F) -> Self
    where
        F: Fn(&Hook) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            histogram,
            labels: Arc::new(labels),
        }
    }
}

impl Handler for SummaryHandler {
    fn handle(&self, hook: &mut Hook) {
        let Some(labels) = (self.labels)(hook) else {
            return;
        };
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let seconds = hook.args().duration(keys::DURATION).as_secs_f64();
        match self.histogram.get_metric_with_label_values(&labels) {
            Ok(histogram) => histogram.observe(seconds),
            Err(err) => tracing::warn!(error = %err, "histogram labels rejected"),
        }
    }
}

impl fmt::Debug for CounterHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterHandler").finish_non_exhaustive()
    }
}

impl fmt::Debug for SummaryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryHandler").finish_non_exhaustive()
    }
}
