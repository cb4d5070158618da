use crate::error::RemoteError;
use crate::types::{Batch, PredictionResult};

/// The remote prediction service, seen as an opaque blocking call.
///
/// `score` receives batches in submission order and must return one [`PredictionResult`] per
/// batch, in the same order, each carrying one value row per submitted row. Implementations are
/// shared across concurrent invocations and must not keep per-invocation state. Timeouts and
/// cancellation belong to the implementation; the adapter waits for whatever `score` returns.
pub trait ScoringClient: Send + Sync {
    fn score(&self, batches: &[Batch]) -> Result<Vec<PredictionResult>, RemoteError>;
}

impl<F> ScoringClient for F
where
    F: Fn(&[Batch]) -> Result<Vec<PredictionResult>, RemoteError> + Send + Sync,
{
    fn score(&self, batches: &[Batch]) -> Result<Vec<PredictionResult>, RemoteError> {
        self(batches)
    }
}
