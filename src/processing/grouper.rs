//! Grouping of mapped rows into batch requests.

use crate::types::{Batch, BatchList};

use super::mapper::MappedRow;

/// Group rows into the fewest batches that keep input order.
///
/// A batch is a maximal run of consecutive rows with the same field list. Field lists are compared
/// as sequences: `[A, B]` and `[B, A]` open separate batches. No empty batch is ever emitted, so
/// an input without rows yields an empty list.
pub fn group_rows<I>(rows: I) -> BatchList
where
    I: IntoIterator<Item = MappedRow>,
{
    let mut batches = Vec::new();
    let mut current: Option<Batch> = None;

    for row in rows {
        if let Some(batch) = current.as_mut().filter(|b| b.fields == row.fields) {
            batch.values.push(row.values);
            continue;
        }
        batches.extend(current.take());
        current = Some(Batch {
            fields: row.fields,
            values: vec![row.values],
        });
    }

    batches.extend(current);
    batches
}
