//! Projection of input records onto the model field schema.

use crate::config::FieldMapping;
use crate::types::{InputRecord, RecordStatusList, Value};

/// Prefix of the message attached to records missing a mapped field.
pub const MISSING_MANDATORY_PREFIX: &str = "Missing mandatory input field: ";

/// A record projected onto the model's fields, in rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub fields: Vec<String>,
    pub values: Vec<Value>,
}

/// Why a record could not be mapped: the first mandatory source field that was absent or null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRejection {
    pub source_field: String,
}

impl MappingRejection {
    /// Message stored on the record's status.
    pub fn message(&self) -> String {
        format!("{MISSING_MANDATORY_PREFIX}{}", self.source_field)
    }
}

/// Map one record, stopping at the first missing or null field.
pub fn map_record(record: &InputRecord, mapping: &FieldMapping) -> Result<MappedRow, MappingRejection> {
    let mut fields = Vec::with_capacity(mapping.len());
    let mut values = Vec::with_capacity(mapping.len());

    for rule in mapping.rules() {
        match record.get(&rule.source_field) {
            Some(v) if !v.is_null() => {
                fields.push(rule.target_field.clone());
                values.push(v.clone());
            }
            _ => {
                return Err(MappingRejection {
                    source_field: rule.source_field.clone(),
                });
            }
        }
    }

    Ok(MappedRow { fields, values })
}

/// Map every record, recording the result on `statuses`.
///
/// Returns the mapping-valid rows in input order. Rejected records only leave a trace in their
/// status (`mapping_ok == false` plus the rejection message).
pub fn map_records(
    records: &[InputRecord],
    mapping: &FieldMapping,
    statuses: &mut RecordStatusList,
) -> Vec<MappedRow> {
    debug_assert_eq!(records.len(), statuses.len());

    let mut rows = Vec::with_capacity(records.len());
    for (record, status) in records.iter().zip(statuses.iter_mut()) {
        match map_record(record, mapping) {
            Ok(row) => {
                status.mapping_ok = true;
                rows.push(row);
            }
            Err(rejection) => {
                status.mapping_ok = false;
                status.message = Some(rejection.message());
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldRule;

    fn mapping() -> FieldMapping {
        FieldMapping::new(vec![
            FieldRule::new("age", "AGE"),
            FieldRule::new("city", "CITY"),
            FieldRule::new("income", "INCOME"),
        ])
        .unwrap()
    }

    #[test]
    fn maps_in_rule_order_and_renames() {
        let rec = InputRecord::from_pairs([
            ("income", Value::Float64(1.5)),
            ("city", Value::from("Oslo")),
            ("age", Value::Int64(33)),
            ("unused", Value::Bool(true)),
        ]);

        let row = map_record(&rec, &mapping()).unwrap();
        assert_eq!(row.fields, vec!["AGE", "CITY", "INCOME"]);
        assert_eq!(
            row.values,
            vec![Value::Int64(33), Value::from("Oslo"), Value::Float64(1.5)]
        );
    }

    #[test]
    fn reports_first_missing_field_only() {
        let rec = InputRecord::from_pairs([("income", Value::Float64(1.5))]);
        let err = map_record(&rec, &mapping()).unwrap_err();
        assert_eq!(err.source_field, "age");
        assert_eq!(err.message(), "Missing mandatory input field: age");
    }

    #[test]
    fn null_counts_as_missing() {
        let rec = InputRecord::from_pairs([
            ("age", Value::Int64(1)),
            ("city", Value::Null),
            ("income", Value::Float64(2.0)),
        ]);
        assert_eq!(map_record(&rec, &mapping()).unwrap_err().source_field, "city");
    }

    #[test]
    fn map_records_updates_statuses_and_keeps_valid_rows() {
        let full = InputRecord::from_pairs([
            ("age", Value::Int64(1)),
            ("city", Value::from("a")),
            ("income", Value::Float64(2.0)),
        ]);
        let partial = InputRecord::from_pairs([("age", Value::Int64(1))]);
        let records = vec![full.clone(), partial, full];

        let mut statuses = RecordStatusList::new(records.len());
        let rows = map_records(&records, &mapping(), &mut statuses);

        assert_eq!(rows.len(), 2);
        assert_eq!(statuses.mapping_valid_indices(), vec![0, 2]);
        let rejected = statuses.get(1).unwrap();
        assert!(!rejected.mapping_ok);
        assert!(!rejected.score_ok);
        assert_eq!(
            rejected.message.as_deref(),
            Some("Missing mandatory input field: city")
        );
        assert_eq!(statuses.get(0).unwrap().message, None);
    }
}
