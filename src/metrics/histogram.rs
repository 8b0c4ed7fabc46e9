//! In-memory histogram recorder

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{MetricsSink, SchedulerMetric, histogram_name, peak_parallel_histogram_name};
use crate::scheduler::{SchedulerClient, SchedulerOp};

/// Aggregated samples for one histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl HistogramSummary {
    fn new(sample: u64) -> Self {
        Self {
            count: 1,
            sum: sample,
            min: sample,
            max: sample,
        }
    }

    fn add(&mut self, sample: u64) {
        self.count += 1;
        self.sum = self.sum.saturating_add(sample);
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
    }

    /// Mean sample value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Collects scheduler samples keyed by histogram name
///
/// Queue durations are stored in microseconds.
#[derive(Debug, Default)]
pub struct HistogramRecorder {
    histograms: Mutex<HashMap<String, HistogramSummary>>,
}

impl HistogramRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw sample to the named histogram
    pub fn record(&self, name: String, sample: u64) {
        if let Ok(mut histograms) = self.histograms.lock() {
            histograms
                .entry(name)
                .and_modify(|h| h.add(sample))
                .or_insert_with(|| HistogramSummary::new(sample));
        }
    }

    /// Get one histogram
    pub fn get(&self, name: &str) -> Option<HistogramSummary> {
        self.histograms.lock().ok()?.get(name).copied()
    }

    /// All histograms, sorted by name
    pub fn summary(&self) -> Vec<(String, HistogramSummary)> {
        let mut all: Vec<_> = self
            .histograms
            .lock()
            .map(|h| h.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Drop every recorded sample
    pub fn clear(&self) {
        if let Ok(mut histograms) = self.histograms.lock() {
            histograms.clear();
        }
    }
}

impl MetricsSink for HistogramRecorder {
    fn record_queue_length(&self, client: SchedulerClient, op: SchedulerOp, length: usize) {
        self.record(
            histogram_name(client, SchedulerMetric::QueueLength, op),
            length as u64,
        );
    }

    fn record_queue_duration(&self, client: SchedulerClient, op: SchedulerOp, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.record(
            histogram_name(client, SchedulerMetric::QueueDuration, op),
            micros,
        );
    }

    fn record_peak_parallel_shared(&self, client: SchedulerClient, peak: usize) {
        self.record(peak_parallel_histogram_name(client), peak as u64);
    }
}
