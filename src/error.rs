use thiserror::Error;

/// Convenience result type for configuration and engine setup.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type returned when building a mapping configuration or an execution engine.
///
/// Per-record mapping failures and remote scoring failures are *not* reported through this type:
/// they end up as `PredictionError` entries on the affected output records.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Underlying I/O error (e.g. mapping file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The mapping configuration is not valid JSON or has the wrong shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mapping configuration without any rules.
    #[error("field mapping is empty")]
    EmptyMapping,

    /// A rule declared as optional. Every rule must be mandatory.
    #[error("optional fields are not supported (field '{source_field}' is not mandatory)")]
    OptionalFieldUnsupported { source_field: String },

    /// Two rules project onto the same model field.
    #[error("duplicate target field '{target_field}' in field mapping")]
    DuplicateTargetField { target_field: String },

    /// Execution options out of range (zero chunk size, zero threads, ...).
    #[error("invalid execution options: {message}")]
    InvalidOptions { message: String },

    /// The worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Structured part of a classified remote failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorResponse {
    /// HTTP-like status code (e.g. 400 for a bad payload, 404 for an unknown deployment).
    pub status_code: u16,
    /// Service error code, if the body carried one.
    pub code: Option<String>,
    /// Service error message, if the body carried one.
    pub message: Option<String>,
}

/// Failure raised by a [`crate::scoring::ScoringClient`].
///
/// The remote service accepts or rejects a submission as a whole; none of these variants point at
/// an individual row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service rejected the request (malformed payload, unknown deployment, ...).
    #[error("{description}")]
    ApiRequest {
        description: String,
        response: Option<ApiErrorResponse>,
    },

    /// Any other transport failure.
    #[error("{description}")]
    Other { description: String },

    /// The service answered, but the answer cannot be lined up with what was submitted.
    #[error("{description}")]
    MalformedResponse { description: String },
}

impl RemoteError {
    /// Classified API failure without a structured response.
    pub fn api(description: impl Into<String>) -> Self {
        Self::ApiRequest {
            description: description.into(),
            response: None,
        }
    }

    /// Unclassified transport failure.
    pub fn other(description: impl Into<String>) -> Self {
        Self::Other {
            description: description.into(),
        }
    }

    /// The failure description, as attached to affected records.
    pub fn description(&self) -> &str {
        match self {
            Self::ApiRequest { description, .. }
            | Self::Other { description }
            | Self::MalformedResponse { description } => description,
        }
    }

    /// `true` for failures the service itself classified.
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::ApiRequest { .. })
    }

    /// Structured response attached to a classified failure, if any.
    pub fn response(&self) -> Option<&ApiErrorResponse> {
        match self {
            Self::ApiRequest { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}
