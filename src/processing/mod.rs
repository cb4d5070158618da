//! The pure, in-memory stages of an invocation.
//!
//! - [`map_records()`]: project each record onto the model fields (field mapper)
//! - [`group_rows()`]: build the fewest order-preserving batches (batch grouper)
//! - [`reassemble()`] / [`merge_outputs()`]: turn batch results back into per-record outputs
//!
//! The remote call sits between grouping and reassembly; see [`crate::scoring`].
//!
//! ## Example: map → group
//!
//! ```rust
//! use bundle_scoring::config::{FieldMapping, FieldRule};
//! use bundle_scoring::processing::{group_rows, map_records};
//! use bundle_scoring::types::{InputRecord, RecordStatusList, Value};
//!
//! let mapping = FieldMapping::new(vec![FieldRule::new("x", "X"), FieldRule::new("y", "Y")]).unwrap();
//! let records = vec![
//!     InputRecord::from_pairs([("x", Value::Int64(1)), ("y", Value::Int64(2))]),
//!     InputRecord::from_pairs([("x", Value::Int64(3))]),
//!     InputRecord::from_pairs([("x", Value::Int64(5)), ("y", Value::Int64(6))]),
//! ];
//!
//! let mut statuses = RecordStatusList::new(records.len());
//! let rows = map_records(&records, &mapping, &mut statuses);
//! let batches = group_rows(rows);
//!
//! assert_eq!(batches.len(), 1);
//! assert_eq!(batches[0].row_count(), 2);
//! assert_eq!(
//!     statuses.get(1).unwrap().message.as_deref(),
//!     Some("Missing mandatory input field: y")
//! );
//! ```

pub mod grouper;
pub mod mapper;
pub mod reassemble;

pub use grouper::group_rows;
pub use mapper::{MISSING_MANDATORY_PREFIX, MappedRow, MappingRejection, map_record, map_records};
pub use reassemble::{merge_outputs, reassemble};
