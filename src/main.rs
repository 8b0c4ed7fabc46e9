//! Binix Cache Storage - scheduler workload driver
//!
//! Pushes a synthetic mix of cache operations through a scheduler and
//! prints the recorded queue histograms.
//!
//! Usage: binix-cache-storage [--max-shared-ops N] [--operations N] [--exclusive-every N] [--log-metrics]
//!
//! With `--log-metrics`, samples go to the log at trace level instead of
//! the in-memory histograms (run with `RUST_LOG=trace` to see them).

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use binix_cache_storage::{
    CacheStorageScheduler, HistogramRecorder, LogMetricsSink, MetricsSink, NAME, SchedulerClient,
    SchedulerConfig, SchedulerError, SchedulerHandle, SchedulerMode, SchedulerOp,
    SequencedTaskRunner, VERSION,
};

struct Options {
    max_shared_ops: Option<usize>,
    operations: usize,
    exclusive_every: usize,
    log_metrics: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, SchedulerError> {
        let mut options = Self {
            max_shared_ops: None,
            operations: 64,
            exclusive_every: 8,
            log_metrics: false,
        };

        let mut iter = args.iter().skip(1);
        while let Some(flag) = iter.next() {
            if flag == "--log-metrics" {
                options.log_metrics = true;
                continue;
            }

            let value = iter.next().ok_or_else(|| {
                SchedulerError::InvalidConfig(format!("missing value for {}", flag))
            })?;
            let parsed: usize = value.parse().map_err(|_| {
                SchedulerError::InvalidConfig(format!("{} expects a number, got {:?}", flag, value))
            })?;

            match flag.as_str() {
                "--max-shared-ops" => options.max_shared_ops = Some(parsed),
                "--operations" => options.operations = parsed,
                "--exclusive-every" => options.exclusive_every = parsed,
                other => {
                    return Err(SchedulerError::InvalidConfig(format!(
                        "unknown flag {}",
                        other
                    )));
                }
            }
        }

        Ok(options)
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), SchedulerError> {
    let options = Options::parse(args)?;

    let mut config = SchedulerConfig::from_env()?;
    if let Some(max) = options.max_shared_ops {
        config = config.with_max_shared_ops(max);
    }

    println!("🚀 {} v{}", NAME, VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   • max shared ops: {}, operations: {}, exclusive every: {}",
        config.max_shared_ops, options.operations, options.exclusive_every
    );

    let recorder = Arc::new(HistogramRecorder::new());
    let metrics: Arc<dyn MetricsSink> = if options.log_metrics {
        Arc::new(LogMetricsSink)
    } else {
        recorder.clone()
    };
    let (runner, _) = SequencedTaskRunner::spawn();
    let scheduler = CacheStorageScheduler::new(SchedulerClient::Cache, Arc::new(runner), config)?
        .with_metrics(metrics);
    let (handle, sequence) = SchedulerHandle::spawn(scheduler)?;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let work: Vec<_> = (0..options.operations)
        .map(|i| {
            let (mode, op) = if options.exclusive_every > 0 && i % options.exclusive_every == 0 {
                (SchedulerMode::Exclusive, SchedulerOp::Put)
            } else {
                (SchedulerMode::Shared, SchedulerOp::Match)
            };
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            let handle = handle.clone();

            async move {
                handle
                    .run(mode, op, move || async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
            }
        })
        .collect();

    let results = futures::future::join_all(work).await;
    let failed = results.iter().filter(|r| r.is_err()).count();

    handle.shutdown()?;
    if sequence.join().is_err() {
        log::error!("scheduler sequence panicked");
    }

    println!(
        "✅ {} operations in {:?} ({} failed, peak concurrency {})",
        options.operations,
        started.elapsed(),
        failed,
        peak.load(Ordering::SeqCst)
    );
    if options.log_metrics {
        println!("📊 Samples were written to the log");
        return Ok(());
    }

    println!("📊 Histograms:");
    for (name, h) in recorder.summary() {
        println!(
            "   • {}: count={} mean={:.1} min={} max={}",
            name,
            h.count,
            h.mean(),
            h.min,
            h.max
        );
    }

    Ok(())
}
