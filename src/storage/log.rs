//! Append Log
//!
//! A file of back-to-back fixed-width slots. New records go at the end;
//! existing ones are rewritten in place by ordinal.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SyncStrategy;
use crate::error::{DealerError, Result};

use super::{SLOT_STRIDE, SLOT_WIDTH, TERMINATOR};

/// Slot-addressed data file
///
/// The row count is derived from the file length once at open and kept in
/// memory afterwards; every append bumps it by exactly one.
pub struct AppendLog {
    path: PathBuf,
    file: File,
    row_count: u64,
    sync_strategy: SyncStrategy,
    writes_since_sync: usize,
}

impl AppendLog {
    /// Open or create a log file
    ///
    /// A trailing partial slot (left by a crash mid-append) is cut off so the
    /// ordinal → offset mapping stays aligned.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let row_count = len / SLOT_STRIDE;
        let aligned = row_count * SLOT_STRIDE;

        if aligned != len {
            warn!(
                path = %path.display(),
                len,
                aligned,
                "truncating torn trailing slot"
            );
            file.set_len(aligned)?;
        }

        debug!(path = %path.display(), rows = row_count, "opened append log");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            row_count,
            sync_strategy,
            writes_since_sync: 0,
        })
    }

    /// Number of complete slots in the file
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk length in bytes
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Append a slot; returns its ordinal
    pub fn append(&mut self, slot: &[u8]) -> Result<u64> {
        check_slot(slot)?;

        let ordinal = self.row_count;
        let mut buf = Vec::with_capacity(SLOT_STRIDE as usize);
        buf.extend_from_slice(slot);
        buf.push(TERMINATOR);

        self.file.seek(SeekFrom::Start(offset_of(ordinal)))?;
        self.file.write_all(&buf)?;
        self.row_count += 1;
        self.after_write()?;

        debug!(path = %self.path.display(), ordinal, "appended slot");
        Ok(ordinal)
    }

    /// Read the slot at `ordinal` (without its terminator)
    pub fn read_at(&self, ordinal: u64) -> Result<Vec<u8>> {
        self.check_range(ordinal)?;

        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset_of(ordinal)))?;

        let mut slot = vec![0u8; SLOT_WIDTH];
        file.read_exact(&mut slot)?;
        Ok(slot)
    }

    /// Rewrite the slot at `ordinal` in place; the terminator and the file
    /// length are left untouched
    pub fn overwrite_at(&mut self, ordinal: u64, slot: &[u8]) -> Result<()> {
        check_slot(slot)?;
        self.check_range(ordinal)?;

        self.file.seek(SeekFrom::Start(offset_of(ordinal)))?;
        self.file.write_all(slot)?;
        self.after_write()?;

        debug!(path = %self.path.display(), ordinal, "overwrote slot");
        Ok(())
    }

    /// Drop every slot from `rows` onwards
    pub fn truncate_to(&mut self, rows: u64) -> Result<()> {
        if rows > self.row_count {
            return Err(DealerError::OutOfRange {
                ordinal: rows,
                rows: self.row_count,
            });
        }

        self.file.set_len(offset_of(rows))?;
        self.row_count = rows;
        self.file.sync_data()?;

        debug!(path = %self.path.display(), rows, "truncated log");
        Ok(())
    }

    /// Replace the whole file with `slots`
    ///
    /// Writes a sibling temp file, syncs it, then renames it over the log.
    pub fn replace_all(&mut self, slots: &[Vec<u8>]) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            for slot in slots {
                check_slot(slot)?;
                writer.write_all(slot)?;
                writer.write_all(&[TERMINATOR])?;
            }

            writer.flush()?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        self.row_count = slots.len() as u64;
        self.writes_since_sync = 0;

        debug!(path = %self.path.display(), rows = self.row_count, "rewrote log");
        Ok(())
    }

    /// Iterate every slot in file order
    pub fn scan(&self) -> SlotIter<'_> {
        SlotIter {
            file: &self.file,
            next: 0,
            end: self.row_count,
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.writes_since_sync = 0;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_range(&self, ordinal: u64) -> Result<()> {
        if ordinal >= self.row_count {
            return Err(DealerError::OutOfRange {
                ordinal,
                rows: self.row_count,
            });
        }
        Ok(())
    }

    fn after_write(&mut self) -> Result<()> {
        self.writes_since_sync += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNWrites { count } => self.writes_since_sync >= count,
            SyncStrategy::OsManaged => false,
        };

        if due {
            self.sync()?;
        }
        Ok(())
    }
}

/// Iterator over `(ordinal, slot)` pairs
///
/// Seeks before every read, so point reads on the same log between items
/// don't disturb it.
pub struct SlotIter<'a> {
    file: &'a File,
    next: u64,
    end: u64,
}

impl Iterator for SlotIter<'_> {
    type Item = Result<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let ordinal = self.next;
        self.next += 1;

        let mut slot = vec![0u8; SLOT_WIDTH];
        let mut file = self.file;
        let read = file
            .seek(SeekFrom::Start(offset_of(ordinal)))
            .and_then(|_| file.read_exact(&mut slot));

        Some(read.map(|_| (ordinal, slot)).map_err(DealerError::from))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.end - self.next) as usize;
        (left, Some(left))
    }
}

fn offset_of(ordinal: u64) -> u64 {
    ordinal * SLOT_STRIDE
}

fn check_slot(slot: &[u8]) -> Result<()> {
    if slot.len() > SLOT_WIDTH {
        return Err(DealerError::RecordTooLarge {
            len: slot.len(),
            max: SLOT_WIDTH,
        });
    }
    if slot.len() < SLOT_WIDTH {
        return Err(DealerError::MalformedRecord(format!(
            "slot is {} bytes, expected {}",
            slot.len(),
            SLOT_WIDTH
        )));
    }
    Ok(())
}
