//! Observer hooks for invocations and parallel runs.
//!
//! Every stage of the pipeline reports a [`ScoringEvent`] to the configured
//! [`ScoringObserver`] (if any). [`TracingObserver`] forwards events to `tracing`, and
//! [`CompositeObserver`] fans out to several observers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::execution::ExecutionMetricsSnapshot;
use crate::invocation::InvocationReport;

/// Events emitted while scoring.
#[derive(Debug, Clone)]
pub enum ScoringEvent {
    InvocationStarted { records: usize },
    RecordRejected { index: usize, message: String },
    BatchesBuilt { batches: usize, rows: usize },
    RemoteCallFailed { batches: usize, message: String },
    InvocationFinished { report: InvocationReport },
    RunStarted { records: usize, chunks: usize },
    ThrottleWaited { duration: Duration },
    ChunkStarted { start_row: usize, row_count: usize },
    ChunkFinished { predictions: usize, errors: usize },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for scoring events.
pub trait ScoringObserver: Send + Sync {
    fn on_event(&self, event: &ScoringEvent);
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ScoringObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ScoringObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ScoringObserver for CompositeObserver {
    fn on_event(&self, event: &ScoringEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Logs scoring events through `tracing`.
///
/// Remote failures are logged at `error`, rejections at `debug`, run summaries at `info`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ScoringObserver for TracingObserver {
    fn on_event(&self, event: &ScoringEvent) {
        match event {
            ScoringEvent::RemoteCallFailed { batches, message } => {
                tracing::error!(batches, error = %message, "remote scoring call failed");
            }
            ScoringEvent::RecordRejected { index, message } => {
                tracing::debug!(index, reason = %message, "record rejected by field mapping");
            }
            ScoringEvent::InvocationFinished { report } => {
                tracing::info!(%report, "invocation finished");
            }
            ScoringEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(elapsed_ms = elapsed.as_millis(), %metrics, "scoring run finished");
            }
            ScoringEvent::ThrottleWaited { duration } => {
                tracing::debug!(wait_ms = duration.as_millis(), "throttled before remote call");
            }
            other => tracing::trace!(event = ?other, "scoring event"),
        }
    }
}
