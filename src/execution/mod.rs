//! Parallel scoring of large record sequences.
//!
//! This module sits "above" [`crate::invocation`] and provides:
//!
//! - Chunked execution: a long record sequence is split into chunk-sized invocations
//! - Resource limits: a bound on invocations talking to the remote endpoint at once
//! - Real-time metrics + observer events for monitoring
//!
//! Each chunk is an independent invocation with its own statuses, batches and results; only the
//! [`ScoringAdapter`] (and its client) is shared. Outputs are concatenated in input order.

mod metrics;
mod semaphore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::{AdapterError, AdapterResult};
use crate::invocation::ScoringAdapter;
use crate::observability::{ScoringEvent, ScoringObserver};
use crate::types::{InputRecord, OutputRecord};

pub use metrics::{ExecutionMetrics, ExecutionMetricsSnapshot};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of records per invocation.
    pub chunk_size: usize,
    /// Upper bound on concurrently running invocations (and so on concurrent remote calls).
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 256,
            max_in_flight_chunks: n.max(1),
        }
    }
}

impl ExecutionOptions {
    fn validate(&self) -> AdapterResult<()> {
        let invalid = |message: &str| {
            Err(AdapterError::InvalidOptions {
                message: message.to_string(),
            })
        };
        if self.chunk_size == 0 {
            return invalid("chunk_size must be > 0");
        }
        if self.max_in_flight_chunks == 0 {
            return invalid("max_in_flight_chunks must be > 0");
        }
        if self.num_threads == Some(0) {
            return invalid("num_threads must be > 0 when set");
        }
        Ok(())
    }
}

/// Runs many invocations concurrently against one shared [`ScoringAdapter`].
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ScoringObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `chunk_size == 0`, `max_in_flight_chunks == 0`, `num_threads == Some(0)`, or the
    /// thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> AdapterResult<Self> {
        opts.validate()?;

        let n_threads = opts.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for run-level events (chunks, throttling, totals).
    pub fn with_observer(mut self, observer: Arc<dyn ScoringObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Score `records` in chunk-sized invocations, returning one output per record, in order.
    pub fn score_parallel(&self, adapter: &ScoringAdapter, records: &[InputRecord]) -> Vec<OutputRecord> {
        self.pool.install(|| self.score_parallel_impl(adapter, records))
    }

    fn score_parallel_impl(&self, adapter: &ScoringAdapter, records: &[InputRecord]) -> Vec<OutputRecord> {
        let start = Instant::now();
        let ranges = chunk_ranges(records.len(), self.opts.chunk_size);
        self.metrics.begin_run();
        self.emit(ScoringEvent::RunStarted {
            records: records.len(),
            chunks: ranges.len(),
        });
        tracing::debug!(
            records = records.len(),
            chunks = ranges.len(),
            chunk_size = self.opts.chunk_size,
            "starting parallel scoring run"
        );

        let sem = Semaphore::new(self.opts.max_in_flight_chunks);

        let per_chunk: Vec<Vec<OutputRecord>> = ranges
            .into_par_iter()
            .map(|range| {
                let permit = sem.acquire();
                if permit.waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited);
                    self.emit(ScoringEvent::ThrottleWaited {
                        duration: permit.waited,
                    });
                }

                self.metrics.on_invocation_start();
                self.emit(ScoringEvent::ChunkStarted {
                    start_row: range.start,
                    row_count: range.len(),
                });

                let (outputs, report) = adapter.score_with_report(&records[range]);

                self.metrics.on_invocation_end(&report);
                self.emit(ScoringEvent::ChunkFinished {
                    predictions: report.predictions,
                    errors: report.errors,
                });
                drop(permit);
                outputs
            })
            .collect();

        let out: Vec<OutputRecord> = per_chunk.into_iter().flatten().collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ScoringEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        out
    }

    fn emit(&self, event: ScoringEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<std::ops::Range<usize>> {
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(row_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ExecutionEngine, ExecutionOptions, chunk_ranges};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::config::{FieldMapping, FieldRule};
    use crate::error::{AdapterError, RemoteError};
    use crate::invocation::ScoringAdapter;
    use crate::observability::{ScoringEvent, ScoringObserver};
    use crate::types::{Batch, InputRecord, PredictionResult, Value};

    fn records(n: usize) -> Vec<InputRecord> {
        (0..n as i64)
            .map(|i| InputRecord::from_pairs([("id", Value::Int64(i))]))
            .collect()
    }

    fn echo_adapter(delay: Duration) -> ScoringAdapter {
        let mapping = FieldMapping::new(vec![FieldRule::new("id", "ID")]).unwrap();
        let client = move |batches: &[Batch]| -> Result<Vec<PredictionResult>, RemoteError> {
            std::thread::sleep(delay);
            Ok(batches
                .iter()
                .map(|b| PredictionResult {
                    fields: vec!["echo".to_string()],
                    values: b.values.clone(),
                })
                .collect())
        };
        ScoringAdapter::new(mapping, Arc::new(client))
    }

    struct ConcurrencyObserver {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScoringObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ScoringEvent) {
            match event {
                ScoringEvent::ChunkStarted { .. } => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active.fetch_max(now, Ordering::SeqCst);
                }
                ScoringEvent::ChunkFinished { .. } => {
                    self.active.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn chunk_ranges_cover_every_row_once() {
        assert_eq!(chunk_ranges(0, 4), Vec::<std::ops::Range<usize>>::new());
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn parallel_outputs_keep_input_order() {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            chunk_size: 3,
            max_in_flight_chunks: 4,
        })
        .unwrap();
        let input = records(50);

        let out = engine.score_parallel(&echo_adapter(Duration::from_millis(1)), &input);

        assert_eq!(out.len(), input.len());
        for (i, o) in out.iter().enumerate() {
            assert_eq!(
                o.prediction().unwrap().get("echo"),
                Some(&Value::Int64(i as i64))
            );
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_invocations() {
        let observer = Arc::new(ConcurrencyObserver {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            chunk_size: 1,
            max_in_flight_chunks: 1,
        })
        .unwrap()
        .with_observer(observer.clone());

        let out = engine.score_parallel(&echo_adapter(Duration::from_millis(1)), &records(20));

        assert_eq!(out.len(), 20);
        assert_eq!(observer.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            chunk_size: 2,
            max_in_flight_chunks: 1,
        })
        .unwrap();
        let metrics = engine.metrics();
        let mut input = records(10);
        input[3] = InputRecord::new();

        let out = engine.score_parallel(&echo_adapter(Duration::from_millis(2)), &input);
        assert_eq!(out.len(), 10);

        let snap = metrics.snapshot();
        assert_eq!(snap.records_processed, 10);
        assert_eq!(snap.predictions, 9);
        assert_eq!(snap.prediction_errors, 1);
        assert_eq!(snap.invocations_started, 5);
        assert_eq!(snap.invocations_finished, 5);
        assert_eq!(snap.batches_submitted, 5);
        assert_eq!(snap.max_active_invocations, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(1),
            chunk_size: 0,
            max_in_flight_chunks: 1,
        })
        .err()
        .unwrap();
        assert!(matches!(err, AdapterError::InvalidOptions { .. }));
        assert!(err.to_string().contains("chunk_size"));
    }
}
