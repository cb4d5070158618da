//! Remote scoring: the client seam and the invoker that classifies results onto records.
//!
//! The service accepts or rejects a submission as a whole and never says which row was at fault,
//! so failures are attributed to every record of the failed submission. How large a submission is
//! depends on [`crate::config::FailureScope`].

pub mod client;
pub mod invoker;
pub mod payload;

pub use client::ScoringClient;
pub use invoker::{BatchOutcome, WML_API_ERROR_PREFIX, check_response, score_batches};
pub use payload::{ScoringPayload, ScoringResponse};
