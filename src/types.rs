//! Core data model for a scoring invocation.
//!
//! An invocation starts from a slice of [`InputRecord`]s, tracks one [`RecordStatus`] per record,
//! submits [`Batch`]es, receives one [`PredictionResult`] per batch and ends with one
//! [`OutputRecord`] per input record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// Key under which a successful prediction is merged into the output record.
pub const PREDICTION_KEY: &str = "Prediction";
/// Key under which an error message is merged into the output record.
pub const PREDICTION_ERROR_KEY: &str = "PredictionError";

/// A value read from an input record or returned by the model.
///
/// Lists and objects are carried through unchanged (e.g. a class probability vector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt64(u64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested object.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert into a `serde_json::Value`. Non-finite floats become `null`, since JSON has no
    /// representation for them.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Int64(v) => serde_json::Value::from(*v),
            Self::UInt64(v) => serde_json::Value::from(*v),
            Self::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Utf8(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

/// One input record: field name → value. Read-only to the scoring pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord(BTreeMap<String, Value>);

impl InputRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }

    /// Set a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for InputRecord {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-record bookkeeping for one invocation.
///
/// Written once by the field mapper and once by the scoring invoker, then read by reassembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStatus {
    /// All mapped fields were present and non-null.
    pub mapping_ok: bool,
    /// The record was part of a successful remote call.
    pub score_ok: bool,
    /// First error attributed to this record (mapping or scoring).
    pub message: Option<String>,
}

/// Record statuses indexed parallel to the input sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStatusList(Vec<RecordStatus>);

impl RecordStatusList {
    /// `len` fresh statuses: not mapped, not scored, no message.
    pub fn new(len: usize) -> Self {
        Self(vec![RecordStatus::default(); len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecordStatus> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut RecordStatus> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordStatus> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RecordStatus> {
        self.0.iter_mut()
    }

    /// Original indices of the mapping-valid records, in input order.
    ///
    /// The n-th entry is the record that owns the n-th submitted row.
    pub fn mapping_valid_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, s)| s.mapping_ok)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Rows sharing one ordered field list, submitted together.
///
/// Every row holds exactly `fields.len()` values, in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub fields: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

impl Batch {
    pub fn row_count(&self) -> usize {
        self.values.len()
    }
}

/// Batches in submission order.
pub type BatchList = Vec<Batch>;

/// The service's answer for one submitted [`Batch`]: one value row per submitted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub fields: Vec<String>,
    pub values: Vec<Vec<Value>>,
}

impl PredictionResult {
    pub fn row_count(&self) -> usize {
        self.values.len()
    }
}

/// What the pipeline produced for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Prediction field → predicted value.
    Prediction(BTreeMap<String, Value>),
    /// Why the record has no prediction.
    PredictionError(String),
}

/// An input record together with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub input: InputRecord,
    pub outcome: Outcome,
}

impl OutputRecord {
    pub fn is_prediction(&self) -> bool {
        matches!(self.outcome, Outcome::Prediction(_))
    }

    pub fn prediction(&self) -> Option<&BTreeMap<String, Value>> {
        match &self.outcome {
            Outcome::Prediction(p) => Some(p),
            Outcome::PredictionError(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Prediction(_) => None,
            Outcome::PredictionError(m) => Some(m),
        }
    }

    /// Flat merge of the input fields and the outcome entry.
    ///
    /// The outcome key wins if an input field carries the same name. Non-finite floats (NaN,
    /// infinities) cannot be written as JSON and appear as `null` here; read them from
    /// [`Self::prediction`] when they matter.
    pub fn merged(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut out: serde_json::Map<String, serde_json::Value> = self
            .input
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        match &self.outcome {
            Outcome::Prediction(prediction) => {
                let obj = prediction
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                out.insert(PREDICTION_KEY.to_string(), serde_json::Value::Object(obj));
            }
            Outcome::PredictionError(message) => {
                out.insert(
                    PREDICTION_ERROR_KEY.to_string(),
                    serde_json::Value::String(message.clone()),
                );
            }
        }
        out
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.merged().serialize(serializer)
    }
}
