//! `bundle-scoring` adapts a sequence of structured records to a remote prediction service that
//! only accepts whole batches.
//!
//! Each record is projected onto the fields the model expects (a [`config::FieldMapping`]),
//! consecutive records with the same ordered field list are grouped into one [`types::Batch`],
//! the batches are sent through a [`scoring::ScoringClient`], and the predictions are zipped back
//! onto the records by position. The caller always gets exactly one [`types::OutputRecord`] per
//! input record, in input order, carrying either a `Prediction` or a `PredictionError`.
//!
//! ## Pipeline
//!
//! 1. **Field mapping** ([`processing::map_records`]): a record missing (or holding `null` for) a
//!    mapped field is rejected with `"Missing mandatory input field: <name>"` and never sent.
//! 2. **Grouping** ([`processing::group_rows`]): the fewest batches that keep input order; field
//!    lists are compared as ordered sequences.
//! 3. **Scoring** ([`scoring::score_batches`]): the service rejects or accepts a submission as a
//!    whole, so a failure becomes `"WML API error: <description>"` on every affected record. See
//!    [`config::FailureScope`] for how far a failure reaches.
//! 4. **Reassembly** ([`processing::reassemble`]): the n-th mapping-valid record receives the n-th
//!    prediction row, counting across batches in submission order.
//!
//! ## Quick example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bundle_scoring::config::{FieldMapping, FieldRule};
//! use bundle_scoring::invocation::ScoringAdapter;
//! use bundle_scoring::types::{Batch, InputRecord, PredictionResult, Value};
//! use bundle_scoring::RemoteError;
//!
//! # fn main() -> Result<(), bundle_scoring::AdapterError> {
//! let mapping = FieldMapping::new(vec![
//!     FieldRule::new("age", "AGE"),
//!     FieldRule::new("income", "INCOME"),
//! ])?;
//!
//! // Stand-in for a real deployment: predicts `1` for every row.
//! let client = |batches: &[Batch]| -> Result<Vec<PredictionResult>, RemoteError> {
//!     Ok(batches
//!         .iter()
//!         .map(|b| PredictionResult {
//!             fields: vec!["prediction".to_string()],
//!             values: b.values.iter().map(|_| vec![Value::Int64(1)]).collect(),
//!         })
//!         .collect())
//! };
//!
//! let adapter = ScoringAdapter::new(mapping, Arc::new(client));
//! let out = adapter.score(&[
//!     InputRecord::from_pairs([("age", Value::Int64(41)), ("income", Value::Float64(52.5))]),
//!     InputRecord::from_pairs([("age", Value::Int64(29))]),
//! ]);
//!
//! assert!(out[0].is_prediction());
//! assert_eq!(out[1].error_message(), Some("Missing mandatory input field: income"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: field mapping configuration and scoring options
//! - [`types`]: records, statuses, batches, predictions and outputs
//! - [`processing`]: field mapper, batch grouper, reassembler
//! - [`scoring`]: client seam, invoker, REST payload helpers
//! - [`invocation`]: one end-to-end run ([`invocation::ScoringAdapter`])
//! - [`execution`]: chunked, throttled parallel runs over a shared adapter
//! - [`observability`]: observer hooks and `tracing` integration
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod invocation;
pub mod observability;
pub mod processing;
pub mod scoring;
pub mod types;

pub use error::{AdapterError, AdapterResult, ApiErrorResponse, RemoteError};
