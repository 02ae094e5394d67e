//! Store Module
//!
//! Typed stores over [`Table`]: the catalog (models), the inventory (cars),
//! and the transaction log (sales).
//!
//! ## Key and Mutation Summary
//! ```text
//! store      file        key            mutations
//! ─────────  ──────────  ─────────────  ─────────────────────────────
//! catalog    models.txt  id (assigned)  append
//! inventory  cars.txt    VIN            append, status, VIN rekey
//! sales      sales.txt   sales number   append, soft delete (sentinel)
//! ```

mod catalog;
mod inventory;
mod sales;

pub use catalog::CatalogStore;
pub use inventory::InventoryStore;
pub use sales::SalesStore;

use tracing::warn;

use crate::error::{DealerError, Result};
use crate::storage::{decode_record, is_sentinel, IndexKey, Record, Table};

/// Decode every live record in file order
///
/// Sentinel slots are passed over silently; malformed ones are logged and
/// skipped. I/O errors end the scan.
pub(crate) fn live_records<'a, K, R>(table: &'a Table<K>) -> impl Iterator<Item = Result<R>> + 'a
where
    K: IndexKey + 'a,
    R: Record + 'a,
{
    let kind = table.kind();
    table.scan().filter_map(move |item| {
        let (ordinal, slot) = match item {
            Ok(pair) => pair,
            Err(err) => return Some(Err(err)),
        };
        if is_sentinel(&slot) {
            return None;
        }
        match decode_record::<R>(&slot) {
            Ok(record) => Some(Ok(record)),
            Err(DealerError::MalformedRecord(reason)) => {
                warn!(kind, ordinal, %reason, "skipping malformed slot");
                None
            }
            Err(err) => Some(Err(err)),
        }
    })
}

/// Reject keys the index can't store or find again
pub(crate) fn check_key(kind: &'static str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(DealerError::InvalidField(format!("{} key must not be empty", kind)));
    }
    if key != key.trim() {
        return Err(DealerError::InvalidField(format!(
            "{} key {:?} has surrounding whitespace",
            kind, key
        )));
    }
    Ok(())
}
