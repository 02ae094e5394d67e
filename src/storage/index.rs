//! Sorted Index
//!
//! Side file of `key;ordinal` slots kept in key order. The whole index is
//! held in memory as a sorted vector: lookups are a binary search, and every
//! mutation builds the patched vector, rewrites the file from scratch, and
//! swaps the vector in once the rewrite has landed.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::SyncStrategy;
use crate::error::Result;

use super::codec::{decode, encode, is_sentinel};
use super::log::AppendLog;

/// Key types an index can hold
///
/// Ordering comes from `Ord`: byte order for strings, numeric for integers.
pub trait IndexKey: Ord + Clone + fmt::Debug + fmt::Display {
    /// Parse a key as stored in the index file
    fn parse_key(raw: &str) -> Option<Self>;
}

impl IndexKey for String {
    fn parse_key(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

impl IndexKey for u64 {
    fn parse_key(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Key → ordinal index backed by its own slot file
pub struct SortedIndex<K> {
    log: AppendLog,
    /// Sorted by key, one entry per key
    entries: Vec<(K, u64)>,
}

impl<K: IndexKey> SortedIndex<K> {
    /// Open or create an index file and load it into memory
    ///
    /// Sentinel and unparsable rows are skipped. An unsorted file is sorted
    /// in memory; for duplicate keys the last row wins.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let log = AppendLog::open(path, sync_strategy)?;

        let mut entries = Vec::with_capacity(log.row_count() as usize);
        for item in log.scan() {
            let (row, slot) = item?;
            if is_sentinel(&slot) {
                continue;
            }
            match parse_entry::<K>(&slot) {
                Some(entry) => entries.push(entry),
                None => warn!(path = %path.display(), row, "skipping malformed index row"),
            }
        }

        if !entries.windows(2).all(|w| w[0].0 <= w[1].0) {
            warn!(path = %path.display(), "index file out of order, re-sorting in memory");
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let before = entries.len();
        entries.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                earlier.1 = later.1;
                true
            } else {
                false
            }
        });
        if entries.len() != before {
            warn!(
                path = %path.display(),
                dropped = before - entries.len(),
                "collapsed duplicate index keys"
            );
        }

        debug!(path = %path.display(), entries = entries.len(), "loaded index");

        Ok(Self { log, entries })
    }

    /// Ordinal for `key`, by binary search
    pub fn lookup<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.position(key).ok().map(|i| self.entries[i].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.position(key).is_ok()
    }

    /// Add `key` or repoint it, then rewrite the file
    ///
    /// Returns the ordinal `key` pointed at before, if any.
    pub fn insert_or_update(&mut self, key: K, ordinal: u64) -> Result<Option<u64>> {
        let mut next = self.entries.clone();
        let previous = match next.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => Some(std::mem::replace(&mut next[i].1, ordinal)),
            Err(i) => {
                next.insert(i, (key, ordinal));
                None
            }
        };

        self.persist(next)?;
        Ok(previous)
    }

    /// Move the entry for `old` to `new`, then rewrite the file
    ///
    /// Returns the ordinal that moved, or `None` if `old` isn't indexed. If
    /// `new` is already present it is repointed at the moved ordinal.
    pub fn rekey<Q>(&mut self, old: &Q, new: K) -> Result<Option<u64>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let from = match self.position(old) {
            Ok(i) => i,
            Err(_) => return Ok(None),
        };

        let mut next = self.entries.clone();
        let (_, ordinal) = next.remove(from);
        match next.binary_search_by(|(k, _)| k.cmp(&new)) {
            Ok(i) => next[i].1 = ordinal,
            Err(i) => next.insert(i, (new, ordinal)),
        }

        self.persist(next)?;
        Ok(Some(ordinal))
    }

    /// Drop the entry for `key`. Only used to undo an uncommitted insert.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Result<Option<u64>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let i = match self.position(key) {
            Ok(i) => i,
            Err(_) => return Ok(None),
        };

        let mut next = self.entries.clone();
        let (_, ordinal) = next.remove(i);

        self.persist(next)?;
        Ok(Some(ordinal))
    }

    /// Entries in key order
    pub fn entries(&self) -> &[(K, u64)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows currently in the index file
    pub fn row_count(&self) -> u64 {
        self.log.row_count()
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn position<Q>(&self, key: &Q) -> std::result::Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.binary_search_by(|(k, _)| k.borrow().cmp(key))
    }

    /// Write `next` to disk, and only then make it the in-memory index
    fn persist(&mut self, next: Vec<(K, u64)>) -> Result<()> {
        let slots = next
            .iter()
            .map(|(key, ordinal)| encode_entry(key, *ordinal))
            .collect::<Result<Vec<_>>>()?;
        self.log.replace_all(&slots)?;
        self.entries = next;
        Ok(())
    }
}

fn encode_entry<K: IndexKey>(key: &K, ordinal: u64) -> Result<Vec<u8>> {
    encode(&[key.to_string(), ordinal.to_string()])
}

fn parse_entry<K: IndexKey>(slot: &[u8]) -> Option<(K, u64)> {
    let fields = decode(slot).ok()?;
    match fields.as_slice() {
        [key, ordinal] => Some((K::parse_key(key)?, ordinal.parse().ok()?)),
        _ => None,
    }
}
