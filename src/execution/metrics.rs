use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::invocation::InvocationReport;

/// Real-time metrics for a parallel scoring run.
///
/// The engine updates these counters while invocations run; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    records_processed: AtomicU64,
    predictions: AtomicU64,
    prediction_errors: AtomicU64,
    batches_submitted: AtomicU64,
    invocations_started: AtomicU64,
    invocations_finished: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_invocations: AtomicUsize,
    max_active_invocations: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            records_processed: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            prediction_errors: AtomicU64::new(0),
            batches_submitted: AtomicU64::new(0),
            invocations_started: AtomicU64::new(0),
            invocations_finished: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_invocations: AtomicUsize::new(0),
            max_active_invocations: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        for counter in [
            &self.elapsed_ns,
            &self.records_processed,
            &self.predictions,
            &self.prediction_errors,
            &self.batches_submitted,
            &self.invocations_started,
            &self.invocations_finished,
            &self.throttle_wait_ns,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.active_invocations.store(0, Ordering::SeqCst);
        self.max_active_invocations.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_invocation_start(&self) {
        self.invocations_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_invocations.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_invocations.fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_invocation_end(&self, report: &InvocationReport) {
        self.records_processed
            .fetch_add(report.records as u64, Ordering::SeqCst);
        self.predictions
            .fetch_add(report.predictions as u64, Ordering::SeqCst);
        self.prediction_errors
            .fetch_add(report.errors as u64, Ordering::SeqCst);
        self.batches_submitted
            .fetch_add(report.batches as u64, Ordering::SeqCst);
        self.invocations_finished.fetch_add(1, Ordering::SeqCst);
        self.active_invocations.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        self.throttle_wait_ns
            .fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns));

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            records_processed: self.records_processed.load(Ordering::SeqCst),
            predictions: self.predictions.load(Ordering::SeqCst),
            prediction_errors: self.prediction_errors.load(Ordering::SeqCst),
            batches_submitted: self.batches_submitted.load(Ordering::SeqCst),
            invocations_started: self.invocations_started.load(Ordering::SeqCst),
            invocations_finished: self.invocations_finished.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_invocations: self.max_active_invocations.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub records_processed: u64,
    pub predictions: u64,
    pub prediction_errors: u64,
    pub batches_submitted: u64,
    pub invocations_started: u64,
    pub invocations_finished: u64,
    pub throttle_wait: Duration,
    pub max_active_invocations: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, records={}, predictions={}, errors={}, batches={}, invocations={}/{}, max_active={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.records_processed,
            self.predictions,
            self.prediction_errors,
            self.batches_submitted,
            self.invocations_finished,
            self.invocations_started,
            self.max_active_invocations,
            self.throttle_wait,
            self.elapsed
        )
    }
}
