//! Scheduler instrumentation
//!
//! The scheduler reports three kinds of samples through a [`MetricsSink`]:
//! - queue length when an operation is enqueued
//! - queue duration when an operation is promoted
//! - peak shared parallelism when the shared pool drains
//!
//! Sinks observe only; they never influence scheduling.

mod histogram;

pub use histogram::{HistogramRecorder, HistogramSummary};

use std::time::Duration;

use crate::scheduler::{SchedulerClient, SchedulerOp};

/// Sample kinds keyed by operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerMetric {
    QueueLength,
    QueueDuration,
}

impl SchedulerMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerMetric::QueueLength => "QueueLength",
            SchedulerMetric::QueueDuration => "QueueDuration2",
        }
    }
}

/// Histogram name for a per-operation sample
pub fn histogram_name(client: SchedulerClient, metric: SchedulerMetric, op: SchedulerOp) -> String {
    format!(
        "ServiceWorkerCache.{}.Scheduler.{}.{}",
        client.as_str(),
        metric.as_str(),
        op.as_str()
    )
}

/// Histogram name for the peak shared parallelism sample
pub fn peak_parallel_histogram_name(client: SchedulerClient) -> String {
    format!(
        "ServiceWorkerCache.{}.Scheduler.PeakParallelSharedOps",
        client.as_str()
    )
}

/// Receiver for scheduler instrumentation samples
#[cfg_attr(test, mockall::automock)]
pub trait MetricsSink: Send + Sync {
    /// Pending queue length observed just before an operation is enqueued
    fn record_queue_length(&self, client: SchedulerClient, op: SchedulerOp, length: usize);

    /// Time an operation spent between creation and dispatch
    fn record_queue_duration(&self, client: SchedulerClient, op: SchedulerOp, duration: Duration);

    /// Highest shared parallelism reached during the burst that just ended
    fn record_peak_parallel_shared(&self, client: SchedulerClient, peak: usize);
}

/// Discards every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record_queue_length(&self, _: SchedulerClient, _: SchedulerOp, _: usize) {}

    fn record_queue_duration(&self, _: SchedulerClient, _: SchedulerOp, _: Duration) {}

    fn record_peak_parallel_shared(&self, _: SchedulerClient, _: usize) {}
}

/// Writes every sample to the `log` facade at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetricsSink;

impl MetricsSink for LogMetricsSink {
    fn record_queue_length(&self, client: SchedulerClient, op: SchedulerOp, length: usize) {
        log::trace!(
            "{} = {}",
            histogram_name(client, SchedulerMetric::QueueLength, op),
            length
        );
    }

    fn record_queue_duration(&self, client: SchedulerClient, op: SchedulerOp, duration: Duration) {
        log::trace!(
            "{} = {:?}",
            histogram_name(client, SchedulerMetric::QueueDuration, op),
            duration
        );
    }

    fn record_peak_parallel_shared(&self, client: SchedulerClient, peak: usize) {
        log::trace!("{} = {}", peak_parallel_histogram_name(client), peak);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Trace {
                CAPTURED.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    #[test]
    fn test_log_sink_writes_samples() {
        // Another logger may already be installed; only ours captures.
        let installed = log::set_logger(&LOGGER).is_ok();
        log::set_max_level(log::LevelFilter::Trace);

        let sink = LogMetricsSink;
        sink.record_queue_length(SchedulerClient::Cache, SchedulerOp::Put, 3);
        sink.record_queue_duration(
            SchedulerClient::Storage,
            SchedulerOp::Open,
            Duration::from_millis(7),
        );
        sink.record_peak_parallel_shared(SchedulerClient::Cache, 5);

        if !installed {
            return;
        }

        let captured = CAPTURED.lock().unwrap();
        let find = |name: &str| {
            captured
                .iter()
                .find(|line| line.starts_with(name))
                .cloned()
                .unwrap_or_default()
        };
        assert_eq!(
            find("ServiceWorkerCache.Cache.Scheduler.QueueLength.Put"),
            "ServiceWorkerCache.Cache.Scheduler.QueueLength.Put = 3"
        );
        assert_eq!(
            find("ServiceWorkerCache.CacheStorage.Scheduler.QueueDuration2.Open"),
            "ServiceWorkerCache.CacheStorage.Scheduler.QueueDuration2.Open = 7ms"
        );
        assert_eq!(
            find("ServiceWorkerCache.Cache.Scheduler.PeakParallelSharedOps"),
            "ServiceWorkerCache.Cache.Scheduler.PeakParallelSharedOps = 5"
        );
    }

    #[test]
    fn test_histogram_names() {
        assert_eq!(
            histogram_name(
                SchedulerClient::Cache,
                SchedulerMetric::QueueLength,
                SchedulerOp::Put
            ),
            "ServiceWorkerCache.Cache.Scheduler.QueueLength.Put"
        );
        assert_eq!(
            histogram_name(
                SchedulerClient::Storage,
                SchedulerMetric::QueueDuration,
                SchedulerOp::Open
            ),
            "ServiceWorkerCache.CacheStorage.Scheduler.QueueDuration2.Open"
        );
        assert_eq!(
            peak_parallel_histogram_name(SchedulerClient::Cache),
            "ServiceWorkerCache.Cache.Scheduler.PeakParallelSharedOps"
        );
    }
}
