//! One end-to-end scoring invocation.
//!
//! [`ScoringAdapter::score`] runs the field mapper, the batch grouper, the remote call and
//! reassembly over one materialized slice of records. All per-invocation state lives on the stack
//! of that call; an adapter can be shared across threads.

use std::fmt;
use std::sync::Arc;

use crate::config::{FieldMapping, ScoringOptions};
use crate::observability::ScoringEvent;
use crate::processing::{group_rows, map_records, merge_outputs, reassemble};
use crate::scoring::{BatchOutcome, ScoringClient, score_batches};
use crate::types::{InputRecord, OutputRecord, RecordStatusList};

/// Counts describing one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationReport {
    pub records: usize,
    pub mapping_valid: usize,
    pub batches: usize,
    /// Records that ended with a prediction.
    pub predictions: usize,
    /// Records that ended with an error.
    pub errors: usize,
}

impl fmt::Display for InvocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records={}, mapping_valid={}, batches={}, predictions={}, errors={}",
            self.records, self.mapping_valid, self.batches, self.predictions, self.errors
        )
    }
}

/// Scores record slices against one model deployment.
pub struct ScoringAdapter {
    mapping: FieldMapping,
    client: Arc<dyn ScoringClient>,
    options: ScoringOptions,
}

impl fmt::Debug for ScoringAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringAdapter")
            .field("mapping", &self.mapping)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ScoringAdapter {
    pub fn new(mapping: FieldMapping, client: Arc<dyn ScoringClient>) -> Self {
        Self {
            mapping,
            client,
            options: ScoringOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScoringOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Score `records`, returning exactly one output per record, in input order.
    pub fn score(&self, records: &[InputRecord]) -> Vec<OutputRecord> {
        self.score_with_report(records).0
    }

    /// Like [`Self::score`], but returns flat merged JSON objects.
    pub fn score_json(&self, records: &[InputRecord]) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.score(records).iter().map(OutputRecord::merged).collect()
    }

    /// Score `records` and report what happened.
    pub fn score_with_report(&self, records: &[InputRecord]) -> (Vec<OutputRecord>, InvocationReport) {
        let span = tracing::debug_span!(
            "invocation",
            records = records.len(),
            deployment = self.options.deployment_id.as_deref().unwrap_or("-")
        );
        let _guard = span.enter();
        self.emit(ScoringEvent::InvocationStarted {
            records: records.len(),
        });

        let mut statuses = RecordStatusList::new(records.len());
        let rows = map_records(records, &self.mapping, &mut statuses);
        let mapping_valid = rows.len();
        self.report_rejections(&statuses);

        let batches = group_rows(rows);
        tracing::debug!(
            mapping_valid,
            rejected = records.len() - mapping_valid,
            batches = batches.len(),
            "built scoring batches"
        );
        self.emit(ScoringEvent::BatchesBuilt {
            batches: batches.len(),
            rows: mapping_valid,
        });

        let outcomes = score_batches(
            self.client.as_ref(),
            &batches,
            &mut statuses,
            self.options.failure_scope,
        );
        self.report_failures(&outcomes);

        let outputs = merge_outputs(records, reassemble(&statuses, &outcomes));
        let predictions = outputs.iter().filter(|o| o.is_prediction()).count();
        let report = InvocationReport {
            records: records.len(),
            mapping_valid,
            batches: batches.len(),
            predictions,
            errors: outputs.len() - predictions,
        };
        self.emit(ScoringEvent::InvocationFinished { report });

        (outputs, report)
    }

    fn report_rejections(&self, statuses: &RecordStatusList) {
        let rejected = statuses.iter().filter(|s| !s.mapping_ok).count();
        if rejected > 0 {
            tracing::warn!(rejected, "records rejected by field mapping");
        }
        if self.options.observer.is_none() {
            return;
        }
        for (index, status) in statuses.iter().enumerate() {
            if let (false, Some(message)) = (status.mapping_ok, &status.message) {
                self.emit(ScoringEvent::RecordRejected {
                    index,
                    message: message.clone(),
                });
            }
        }
    }

    fn report_failures(&self, outcomes: &[BatchOutcome]) {
        let mut failed = 0;
        let mut last_message = None;
        for outcome in outcomes {
            if let BatchOutcome::Failed { message, .. } = outcome {
                failed += 1;
                last_message = Some(message);
            }
        }
        if let Some(message) = last_message {
            self.emit(ScoringEvent::RemoteCallFailed {
                batches: failed,
                message: message.clone(),
            });
        }
    }

    fn emit(&self, event: ScoringEvent) {
        if let Some(obs) = &self.options.observer {
            obs.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::{FailureScope, FieldRule};
    use crate::error::RemoteError;
    use crate::observability::ScoringObserver;
    use crate::types::{Batch, PredictionResult, Value};

    #[derive(Default)]
    struct Recording(Mutex<Vec<ScoringEvent>>);

    impl ScoringObserver for Recording {
        fn on_event(&self, event: &ScoringEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn mapping() -> FieldMapping {
        FieldMapping::new(vec![FieldRule::new("a", "A")]).unwrap()
    }

    fn record(a: Option<i64>) -> InputRecord {
        let mut r = InputRecord::from_pairs([("id", Value::from("r"))]);
        if let Some(a) = a {
            r.insert("a", a);
        }
        r
    }

    fn doubling(batches: &[Batch]) -> Result<Vec<PredictionResult>, RemoteError> {
        Ok(batches
            .iter()
            .map(|b| PredictionResult {
                fields: vec!["double".to_string()],
                values: b
                    .values
                    .iter()
                    .map(|r| match r[0] {
                        Value::Int64(v) => vec![Value::Int64(v * 2)],
                        _ => vec![Value::Null],
                    })
                    .collect(),
            })
            .collect())
    }

    #[test]
    fn report_counts_every_stage() {
        let adapter = ScoringAdapter::new(mapping(), Arc::new(doubling));
        let (outputs, report) =
            adapter.score_with_report(&[record(Some(1)), record(None), record(Some(3))]);

        assert_eq!(outputs.len(), 3);
        assert_eq!(
            report,
            InvocationReport {
                records: 3,
                mapping_valid: 2,
                batches: 1,
                predictions: 2,
                errors: 1,
            }
        );
        assert_eq!(
            outputs[2].prediction().unwrap().get("double"),
            Some(&Value::Int64(6))
        );
    }

    #[test]
    fn observer_sees_rejections_and_failures() {
        let obs = Arc::new(Recording::default());
        let failing = |_: &[Batch]| -> Result<Vec<PredictionResult>, RemoteError> {
            Err(RemoteError::api("invalid input"))
        };
        let adapter = ScoringAdapter::new(mapping(), Arc::new(failing)).with_options(ScoringOptions {
            failure_scope: FailureScope::Invocation,
            observer: Some(obs.clone()),
            deployment_id: Some("dep-1".to_string()),
        });

        let outputs = adapter.score(&[record(None), record(Some(2))]);
        assert_eq!(outputs[1].error_message(), Some("WML API error: invalid input"));

        let events = obs.0.lock().unwrap();
        assert!(matches!(events[0], ScoringEvent::InvocationStarted { records: 2 }));
        assert!(events.iter().any(|e| matches!(
            e,
            ScoringEvent::RecordRejected { index: 0, message } if message == "Missing mandatory input field: a"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ScoringEvent::RemoteCallFailed { batches: 1, message } if message == "invalid input"
        )));
        assert!(matches!(
            events.last(),
            Some(ScoringEvent::InvocationFinished { report }) if report.errors == 2
        ));
    }

    #[test]
    fn score_json_merges_outcome_into_input() {
        let adapter = ScoringAdapter::new(mapping(), Arc::new(doubling));
        let out = adapter.score_json(&[record(Some(5)), record(None)]);
        assert_eq!(
            serde_json::Value::Object(out[0].clone()),
            serde_json::json!({"a": 5, "id": "r", "Prediction": {"double": 10}})
        );
        assert_eq!(
            serde_json::Value::Object(out[1].clone()),
            serde_json::json!({"id": "r", "PredictionError": "Missing mandatory input field: a"})
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let adapter = ScoringAdapter::new(mapping(), Arc::new(doubling));
        let (outputs, report) = adapter.score_with_report(&[]);
        assert!(outputs.is_empty());
        assert_eq!(report, InvocationReport::default());
    }
}
