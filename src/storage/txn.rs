//! Two-phase writes
//!
//! A store first *prepares* a write: it validates and reads whatever it
//! needs, touching nothing on disk, and hands back a [`PendingWrite`].
//! Committing applies it and returns a [`Receipt`] that can undo it.
//!
//! This gives cross-store operations a way to back out when the second half
//! fails. It is not crash-atomic: there is no write-ahead record.

use tracing::warn;

use crate::error::Result;

/// A slot write that has been validated but not applied
#[derive(Debug, Clone)]
pub enum PendingWrite<K> {
    /// Append `slot` and index it under `key`
    Append { key: K, slot: Vec<u8> },

    /// Replace the slot at `ordinal`; `before` is kept for rollback
    Overwrite {
        ordinal: u64,
        before: Vec<u8>,
        after: Vec<u8>,
    },
}

/// Proof of an applied write, enough to reverse it
#[derive(Debug, Clone)]
pub struct Receipt<K> {
    pub write: PendingWrite<K>,
    /// Ordinal the write landed on
    pub ordinal: u64,
    /// For appends: the ordinal the key pointed at before, if any
    pub replaced: Option<u64>,
}

/// Something that can apply and undo a [`PendingWrite`]
pub trait Participant<K> {
    fn commit(&mut self, pending: PendingWrite<K>) -> Result<Receipt<K>>;

    fn rollback(&mut self, receipt: Receipt<K>) -> Result<()>;
}

/// Commit `a` on `first`, then `b` on `second`
///
/// If the second commit fails the first is rolled back and the second
/// commit's error is returned.
pub fn commit_both<A, B, KA, KB>(
    first: &mut A,
    a: PendingWrite<KA>,
    second: &mut B,
    b: PendingWrite<KB>,
) -> Result<(Receipt<KA>, Receipt<KB>)>
where
    A: Participant<KA>,
    B: Participant<KB>,
{
    let first_receipt = first.commit(a)?;

    match second.commit(b) {
        Ok(second_receipt) => Ok((first_receipt, second_receipt)),
        Err(err) => {
            warn!(error = %err, "second commit failed, rolling back first");
            if let Err(rollback_err) = first.rollback(first_receipt) {
                warn!(error = %rollback_err, "rollback failed; stores may disagree");
            }
            Err(err)
        }
    }
}
