//! Mapping configuration and per-invocation options.
//!
//! A [`FieldMapping`] is an ordered list of [`FieldRule`]s describing how input record fields
//! translate to the fields a model deployment expects. It is usually supplied by the surrounding
//! application as JSON:
//!
//! ```rust
//! use bundle_scoring::config::FieldMapping;
//!
//! # fn main() -> Result<(), bundle_scoring::AdapterError> {
//! let mapping = FieldMapping::from_json_str(
//!     r#"[
//!         {"source_field": "age", "target_field": "AGE"},
//!         {"tuple_field": "income", "model_field": "INCOME", "is_mandatory": true}
//!     ]"#,
//! )?;
//! assert_eq!(mapping.target_fields().collect::<Vec<_>>(), vec!["AGE", "INCOME"]);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};
use crate::observability::ScoringObserver;

/// How one input field is projected onto one model field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field name in the input record.
    #[serde(alias = "tuple_field")]
    pub source_field: String,
    /// Field name expected by the model.
    #[serde(alias = "model_field")]
    pub target_field: String,
    /// Records lacking this field are rejected. Must be `true`.
    #[serde(alias = "is_mandatory", default = "mandatory_by_default")]
    pub mandatory: bool,
}

fn mandatory_by_default() -> bool {
    true
}

impl FieldRule {
    /// A mandatory rule.
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            mandatory: true,
        }
    }
}

/// Accepted JSON shapes for a mapping document.
#[derive(Deserialize)]
#[serde(untagged)]
enum MappingDocument {
    Rules(Vec<FieldRule>),
    Wrapped { field_mapping: Vec<FieldRule> },
}

/// Validated, ordered field mapping. Immutable once built.
///
/// Rule order is the field order declared to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    rules: Vec<FieldRule>,
}

impl FieldMapping {
    /// Validate and build a mapping.
    ///
    /// Fails if `rules` is empty, if two rules share a target field, or if any rule is optional.
    pub fn new(rules: Vec<FieldRule>) -> AdapterResult<Self> {
        if rules.is_empty() {
            return Err(AdapterError::EmptyMapping);
        }

        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !rule.mandatory {
                return Err(AdapterError::OptionalFieldUnsupported {
                    source_field: rule.source_field.clone(),
                });
            }
            if !seen.insert(rule.target_field.as_str()) {
                return Err(AdapterError::DuplicateTargetField {
                    target_field: rule.target_field.clone(),
                });
            }
        }

        Ok(Self { rules })
    }

    /// Parse a mapping from JSON: either an array of rules or `{"field_mapping": [...]}`.
    pub fn from_json_str(input: &str) -> AdapterResult<Self> {
        let rules = match serde_json::from_str::<MappingDocument>(input)? {
            MappingDocument::Rules(rules) => rules,
            MappingDocument::Wrapped { field_mapping } => field_mapping,
        };
        Self::new(rules)
    }

    /// Read and parse a JSON mapping file.
    pub fn from_json_path(path: impl AsRef<Path>) -> AdapterResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Model field names in declared order.
    pub fn target_fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.target_field.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// How far a remote failure reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureScope {
    /// One remote call for all batches; a failure fails every mapping-valid record.
    #[default]
    Invocation,
    /// One remote call per batch; a failure fails only that batch's records.
    Batch,
}

/// Options for a [`crate::invocation::ScoringAdapter`].
///
/// Use [`Default`] for common cases.
#[derive(Clone, Default)]
pub struct ScoringOptions {
    pub failure_scope: FailureScope,
    /// Optional observer for logging/metrics.
    pub observer: Option<Arc<dyn ScoringObserver>>,
    /// Deployment the client talks to; only recorded on log spans.
    pub deployment_id: Option<String>,
}

impl fmt::Debug for ScoringOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringOptions")
            .field("failure_scope", &self.failure_scope)
            .field("observer_set", &self.observer.is_some())
            .field("deployment_id", &self.deployment_id)
            .finish()
    }
}
