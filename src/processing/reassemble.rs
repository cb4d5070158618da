//! Reassembly of per-batch results into per-record outcomes.
//!
//! There is no key linking a prediction row back to its record. The n-th mapping-valid record (in
//! input order) owns the n-th value row across all batch results, taken in submission order.

use std::collections::BTreeMap;

use crate::scoring::BatchOutcome;
use crate::types::{InputRecord, Outcome, OutputRecord, RecordStatus, RecordStatusList, Value};

/// Message for a scored record that has neither a prediction row nor a recorded error.
const NO_PREDICTION_MESSAGE: &str = "No prediction returned for record";

/// Walks value rows across batch outcomes in submission order.
struct RowCursor<'a> {
    outcomes: &'a [BatchOutcome],
    batch: usize,
    row: usize,
}

impl<'a> RowCursor<'a> {
    fn new(outcomes: &'a [BatchOutcome]) -> Self {
        Self {
            outcomes,
            batch: 0,
            row: 0,
        }
    }
}

impl<'a> Iterator for RowCursor<'a> {
    /// `None` inside `Some` marks a row of a failed batch.
    type Item = Option<(&'a [String], &'a [Value])>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let outcome = self.outcomes.get(self.batch)?;
            if self.row < outcome.row_count() {
                let row = self.row;
                self.row += 1;
                return Some(outcome.row(row));
            }
            self.batch += 1;
            self.row = 0;
        }
    }
}

fn error_outcome(status: &RecordStatus) -> Outcome {
    Outcome::PredictionError(
        status
            .message
            .clone()
            .unwrap_or_else(|| NO_PREDICTION_MESSAGE.to_string()),
    )
}

/// Produce one [`Outcome`] per status, in input order.
///
/// Mapping-invalid records are skipped without consuming a row. A mapping-valid record consumes
/// the next row; it gets a prediction only if its status says it was scored.
pub fn reassemble(statuses: &RecordStatusList, outcomes: &[BatchOutcome]) -> Vec<Outcome> {
    let mut cursor = RowCursor::new(outcomes);

    statuses
        .iter()
        .map(|status| {
            if !status.mapping_ok {
                return error_outcome(status);
            }
            match cursor.next() {
                Some(Some((fields, values))) if status.score_ok => {
                    let prediction: BTreeMap<String, Value> = fields
                        .iter()
                        .cloned()
                        .zip(values.iter().cloned())
                        .collect();
                    Outcome::Prediction(prediction)
                }
                _ => error_outcome(status),
            }
        })
        .collect()
}

/// Pair every input record with its outcome.
pub fn merge_outputs(records: &[InputRecord], outcomes: Vec<Outcome>) -> Vec<OutputRecord> {
    debug_assert_eq!(records.len(), outcomes.len());
    records
        .iter()
        .cloned()
        .zip(outcomes)
        .map(|(input, outcome)| OutputRecord { input, outcome })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PredictionResult;

    fn statuses(valid: &[bool], scored: bool) -> RecordStatusList {
        let mut list = RecordStatusList::new(valid.len());
        for (i, ok) in valid.iter().enumerate() {
            let s = list.get_mut(i).unwrap();
            s.mapping_ok = *ok;
            s.score_ok = *ok && scored;
            if !ok {
                s.message = Some(format!("Missing mandatory input field: f{i}"));
            }
        }
        list
    }

    fn prediction(rows: &[i64]) -> BatchOutcome {
        BatchOutcome::Scored(PredictionResult {
            fields: vec!["p".to_string()],
            values: rows.iter().map(|v| vec![Value::Int64(*v)]).collect(),
        })
    }

    fn predicted(outcome: &Outcome) -> Option<i64> {
        match outcome {
            Outcome::Prediction(p) => match p.get("p") {
                Some(Value::Int64(v)) => Some(*v),
                _ => None,
            },
            Outcome::PredictionError(_) => None,
        }
    }

    #[test]
    fn nth_valid_record_gets_nth_row_across_batches() {
        let st = statuses(&[true, false, true, true, false, true], true);
        let outcomes = vec![prediction(&[10, 20]), prediction(&[30, 40])];

        let out = reassemble(&st, &outcomes);
        let got: Vec<Option<i64>> = out.iter().map(predicted).collect();
        assert_eq!(got, vec![Some(10), None, Some(20), Some(30), None, Some(40)]);
        assert_eq!(
            out[1],
            Outcome::PredictionError("Missing mandatory input field: f1".to_string())
        );
    }

    #[test]
    fn failed_batch_rows_are_consumed_but_not_predicted() {
        let mut st = statuses(&[true, true, true], true);
        for i in [1, 2] {
            let s = st.get_mut(i).unwrap();
            s.score_ok = false;
            s.message = Some("WML API error: invalid input".to_string());
        }
        let outcomes = vec![
            prediction(&[1]),
            BatchOutcome::Failed {
                rows: 2,
                message: "invalid input".to_string(),
            },
        ];

        let out = reassemble(&st, &outcomes);
        assert_eq!(predicted(&out[0]), Some(1));
        assert_eq!(
            out[2],
            Outcome::PredictionError("WML API error: invalid input".to_string())
        );
    }

    #[test]
    fn missing_rows_fall_back_to_error() {
        let st = statuses(&[true, true], true);
        let out = reassemble(&st, &[prediction(&[7])]);
        assert_eq!(predicted(&out[0]), Some(7));
        assert_eq!(
            out[1],
            Outcome::PredictionError(NO_PREDICTION_MESSAGE.to_string())
        );
    }

    #[test]
    fn merge_outputs_keeps_input_order() {
        let records = vec![
            InputRecord::from_pairs([("id", Value::Int64(1))]),
            InputRecord::from_pairs([("id", Value::Int64(2))]),
        ];
        let outcomes = vec![
            Outcome::PredictionError("a".to_string()),
            Outcome::PredictionError("b".to_string()),
        ];
        let merged = merge_outputs(&records, outcomes);
        assert_eq!(merged[1].input.get("id"), Some(&Value::Int64(2)));
        assert_eq!(merged[1].error_message(), Some("b"));
    }
}
