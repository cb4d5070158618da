//! Submission of batches and classification of the result onto record statuses.

use crate::config::FailureScope;
use crate::error::RemoteError;
use crate::types::{Batch, PredictionResult, RecordStatusList, Value};

use super::client::ScoringClient;

/// Prefix of the message attached to records that failed remotely.
pub const WML_API_ERROR_PREFIX: &str = "WML API error: ";

/// What came back for one submitted batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Scored(PredictionResult),
    /// The call covering this batch failed; `rows` is the number of rows submitted.
    Failed { rows: usize, message: String },
}

impl BatchOutcome {
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored(_))
    }

    /// Number of record rows this outcome stands for.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Scored(p) => p.row_count(),
            Self::Failed { rows, .. } => *rows,
        }
    }

    /// Prediction fields and the `index`-th value row, if scored.
    pub fn row(&self, index: usize) -> Option<(&[String], &[Value])> {
        match self {
            Self::Scored(p) => p
                .values
                .get(index)
                .map(|row| (p.fields.as_slice(), row.as_slice())),
            Self::Failed { .. } => None,
        }
    }
}

fn malformed(description: String) -> RemoteError {
    RemoteError::MalformedResponse { description }
}

/// Check that `predictions` can be lined up positionally with `batches`.
pub fn check_response(batches: &[Batch], predictions: &[PredictionResult]) -> Result<(), RemoteError> {
    if predictions.len() != batches.len() {
        return Err(malformed(format!(
            "expected {} prediction results, got {}",
            batches.len(),
            predictions.len()
        )));
    }

    for (i, (batch, prediction)) in batches.iter().zip(predictions).enumerate() {
        if prediction.row_count() != batch.row_count() {
            return Err(malformed(format!(
                "prediction result {i} has {} rows, expected {}",
                prediction.row_count(),
                batch.row_count()
            )));
        }
        if let Some(row) = prediction
            .values
            .iter()
            .position(|r| r.len() != prediction.fields.len())
        {
            return Err(malformed(format!(
                "prediction result {i} row {row} has {} values for {} fields",
                prediction.values[row].len(),
                prediction.fields.len()
            )));
        }
    }
    Ok(())
}

fn call(client: &dyn ScoringClient, batches: &[Batch]) -> Result<Vec<PredictionResult>, RemoteError> {
    let predictions = client.score(batches)?;
    check_response(batches, &predictions)?;
    Ok(predictions)
}

fn log_failure(err: &RemoteError, batches: usize) {
    tracing::error!(
        batches,
        classified = err.is_classified(),
        status_code = ?err.response().map(|r| r.status_code),
        error = %err,
        "WML API error"
    );
}

fn api_error_message(description: &str) -> String {
    format!("{WML_API_ERROR_PREFIX}{description}")
}

/// Submit `batches` and record the result on `statuses`.
///
/// Returns one [`BatchOutcome`] per batch, in submission order. With
/// [`FailureScope::Invocation`] all batches go out in a single call and a failure marks every
/// record unscored; with [`FailureScope::Batch`] each batch is its own call and a failure only
/// touches the records of that batch. Records that already carry a message (mapping rejections)
/// keep it. An empty batch list makes no call.
pub fn score_batches(
    client: &dyn ScoringClient,
    batches: &[Batch],
    statuses: &mut RecordStatusList,
    scope: FailureScope,
) -> Vec<BatchOutcome> {
    if batches.is_empty() {
        return Vec::new();
    }
    match scope {
        FailureScope::Invocation => score_all_at_once(client, batches, statuses),
        FailureScope::Batch => score_each_batch(client, batches, statuses),
    }
}

fn score_all_at_once(
    client: &dyn ScoringClient,
    batches: &[Batch],
    statuses: &mut RecordStatusList,
) -> Vec<BatchOutcome> {
    match call(client, batches) {
        Ok(predictions) => {
            for status in statuses.iter_mut().filter(|s| s.mapping_ok) {
                status.score_ok = true;
            }
            tracing::debug!(
                batches = batches.len(),
                rows = predictions.iter().map(PredictionResult::row_count).sum::<usize>(),
                "received predictions"
            );
            predictions.into_iter().map(BatchOutcome::Scored).collect()
        }
        Err(err) => {
            log_failure(&err, batches.len());
            let message = err.description().to_string();
            for status in statuses.iter_mut() {
                status.score_ok = false;
                if status.message.is_none() {
                    status.message = Some(api_error_message(&message));
                }
            }
            batches
                .iter()
                .map(|b| BatchOutcome::Failed {
                    rows: b.row_count(),
                    message: message.clone(),
                })
                .collect()
        }
    }
}

fn score_each_batch(
    client: &dyn ScoringClient,
    batches: &[Batch],
    statuses: &mut RecordStatusList,
) -> Vec<BatchOutcome> {
    let owners = statuses.mapping_valid_indices();
    let mut offset = 0;
    let mut outcomes = Vec::with_capacity(batches.len());

    for (index, batch) in batches.iter().enumerate() {
        let end = (offset + batch.row_count()).min(owners.len());
        let members = &owners[offset..end];
        offset = end;

        let result = call(client, std::slice::from_ref(batch)).and_then(|mut p| {
            p.pop()
                .ok_or_else(|| malformed("empty scoring response".to_string()))
        });

        match result {
            Ok(prediction) => {
                for &i in members {
                    if let Some(status) = statuses.get_mut(i) {
                        status.score_ok = true;
                    }
                }
                tracing::debug!(batch = index, rows = prediction.row_count(), "received predictions");
                outcomes.push(BatchOutcome::Scored(prediction));
            }
            Err(err) => {
                log_failure(&err, 1);
                let message = err.description().to_string();
                for &i in members {
                    if let Some(status) = statuses.get_mut(i) {
                        status.score_ok = false;
                        if status.message.is_none() {
                            status.message = Some(api_error_message(&message));
                        }
                    }
                }
                outcomes.push(BatchOutcome::Failed {
                    rows: batch.row_count(),
                    message,
                });
            }
        }
    }
    outcomes
}
