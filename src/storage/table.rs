//! Table
//!
//! One append log plus its sorted index: `{name}.txt` and
//! `{name}_index.txt` under the data directory.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::config::SyncStrategy;
use crate::error::{DealerError, Result};

use super::index::{IndexKey, SortedIndex};
use super::log::{AppendLog, SlotIter};
use super::txn::{Participant, PendingWrite, Receipt};

/// Keyed slot file
///
/// Every insert appends one slot and indexes it in the same call.
pub struct Table<K> {
    /// Record kind for error messages ("car", "sale", ...)
    kind: &'static str,
    log: AppendLog,
    index: SortedIndex<K>,
}

impl<K: IndexKey> Table<K> {
    /// Open or create the data and index files for `name` in `dir`
    pub fn open(
        dir: &Path,
        name: &str,
        kind: &'static str,
        sync_strategy: SyncStrategy,
    ) -> Result<Self> {
        let log = AppendLog::open(&dir.join(format!("{}.txt", name)), sync_strategy)?;
        let index = SortedIndex::open(&dir.join(format!("{}_index.txt", name)), sync_strategy)?;

        let rows = log.row_count();
        let stale = index.entries().iter().filter(|(_, ord)| *ord >= rows).count();
        if stale > 0 {
            warn!(table = name, stale, rows, "index points past end of data file");
        }

        info!(table = name, rows, keys = index.len(), "opened table");

        Ok(Self { kind, log, index })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn row_count(&self) -> u64 {
        self.log.row_count()
    }

    pub fn log(&self) -> &AppendLog {
        &self.log
    }

    pub fn index(&self) -> &SortedIndex<K> {
        &self.index
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Ordinal of `key`, or `NotFound`
    pub fn ordinal_of<Q>(&self, key: &Q) -> Result<u64>
    where
        K: Borrow<Q>,
        Q: Ord + fmt::Display + ?Sized,
    {
        self.index
            .lookup(key)
            .ok_or_else(|| DealerError::not_found(self.kind, key))
    }

    /// Look up `key` and read its slot
    pub fn get<Q>(&self, key: &Q) -> Result<(u64, Vec<u8>)>
    where
        K: Borrow<Q>,
        Q: Ord + fmt::Display + ?Sized,
    {
        let ordinal = self.ordinal_of(key)?;
        let slot = self.log.read_at(ordinal)?;
        Ok((ordinal, slot))
    }

    /// Append `slot` and index it under `key`; returns the new ordinal
    pub fn insert(&mut self, key: K, slot: Vec<u8>) -> Result<u64> {
        self.commit(PendingWrite::Append { key, slot })
            .map(|receipt| receipt.ordinal)
    }

    pub fn overwrite(&mut self, ordinal: u64, slot: &[u8]) -> Result<()> {
        self.log.overwrite_at(ordinal, slot)
    }

    /// Stage an overwrite of `ordinal`, capturing the current slot
    pub fn prepare_overwrite(&self, ordinal: u64, after: Vec<u8>) -> Result<PendingWrite<K>> {
        let before = self.log.read_at(ordinal)?;
        Ok(PendingWrite::Overwrite {
            ordinal,
            before,
            after,
        })
    }

    /// Move `old`'s index entry to `new`; returns the ordinal
    pub fn rekey<Q>(&mut self, old: &Q, new: K) -> Result<u64>
    where
        K: Borrow<Q>,
        Q: Ord + fmt::Display + ?Sized,
    {
        self.index
            .rekey(old, new)?
            .ok_or_else(|| DealerError::not_found(self.kind, old))
    }

    /// Every slot in file order
    pub fn scan(&self) -> SlotIter<'_> {
        self.log.scan()
    }
}

impl<K: IndexKey> Participant<K> for Table<K> {
    fn commit(&mut self, pending: PendingWrite<K>) -> Result<Receipt<K>> {
        match pending {
            PendingWrite::Append { key, slot } => {
                let ordinal = self.log.append(&slot)?;
                let replaced = match self.index.insert_or_update(key.clone(), ordinal) {
                    Ok(replaced) => replaced,
                    Err(err) => {
                        self.log.truncate_to(ordinal)?;
                        return Err(err);
                    }
                };
                Ok(Receipt {
                    write: PendingWrite::Append { key, slot },
                    ordinal,
                    replaced,
                })
            }
            PendingWrite::Overwrite {
                ordinal,
                before,
                after,
            } => {
                self.log.overwrite_at(ordinal, &after)?;
                Ok(Receipt {
                    write: PendingWrite::Overwrite {
                        ordinal,
                        before,
                        after,
                    },
                    ordinal,
                    replaced: None,
                })
            }
        }
    }

    fn rollback(&mut self, receipt: Receipt<K>) -> Result<()> {
        warn!(kind = self.kind, ordinal = receipt.ordinal, "rolling back write");

        match receipt.write {
            PendingWrite::Append { key, .. } => {
                match receipt.replaced {
                    Some(previous) => {
                        self.index.insert_or_update(key, previous)?;
                    }
                    None => {
                        self.index.remove(&key)?;
                    }
                }
                if self.log.row_count() == receipt.ordinal + 1 {
                    self.log.truncate_to(receipt.ordinal)?;
                }
            }
            PendingWrite::Overwrite { ordinal, before, .. } => {
                self.log.overwrite_at(ordinal, &before)?;
            }
        }
        Ok(())
    }
}
