//! JSON bodies exchanged with an online scoring endpoint.
//!
//! These helpers are for [`super::ScoringClient`] implementations that talk to a REST deployment:
//!
//! - request: `{"input_data": [{"fields": [...], "values": [[...], ...]}, ...]}`
//! - response: `{"predictions": [{"fields": [...], "values": [[...], ...]}, ...]}`
//! - error: `{"errors": [{"code": "...", "message": "..."}]}` with a non-2xx status

use serde::{Deserialize, Serialize};

use crate::error::{ApiErrorResponse, RemoteError};
use crate::types::{Batch, PredictionResult};

/// Request body for one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPayload {
    pub input_data: Vec<Batch>,
}

impl ScoringPayload {
    pub fn new(batches: &[Batch]) -> Self {
        Self {
            input_data: batches.to_vec(),
        }
    }
}

/// Response body of a successful scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResponse {
    pub predictions: Vec<PredictionResult>,
}

impl ScoringResponse {
    /// Parse a response body. A body that does not parse is a malformed response.
    pub fn from_json_str(body: &str) -> Result<Self, RemoteError> {
        serde_json::from_str(body).map_err(|e| RemoteError::MalformedResponse {
            description: format!("invalid scoring response: {e}"),
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    code: Option<String>,
    message: Option<String>,
}

impl ApiErrorResponse {
    /// Read the first entry of an `{"errors": [...]}` body. Unparseable bodies keep only the status.
    pub fn from_body(status_code: u16, body: &str) -> Self {
        let first = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.errors.into_iter().next());
        Self {
            status_code,
            code: first.as_ref().and_then(|e| e.code.clone()),
            message: first.and_then(|e| e.message),
        }
    }
}

impl RemoteError {
    /// Classified failure built from a rejected HTTP response.
    ///
    /// The description is the service's error message, or the status code if it sent none.
    pub fn from_api_response(status_code: u16, body: &str) -> Self {
        let response = ApiErrorResponse::from_body(status_code, body);
        let description = response
            .message
            .clone()
            .unwrap_or_else(|| format!("request failed with status {status_code}"));
        Self::ApiRequest {
            description,
            response: Some(response),
        }
    }
}
