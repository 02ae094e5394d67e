//! Storage Module
//!
//! Fixed-width record files addressed by slot ordinal, plus sorted side
//! indexes mapping natural keys to ordinals.
//!
//! ## Responsibilities
//! - Encode records into fixed-width slots and back
//! - Append slots and overwrite them in place by ordinal
//! - Keep a sorted key → ordinal index next to each data file
//! - Stage multi-file mutations so they can be rolled back
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┬────┐
//! │ Slot 0: field;field;...   (padded to 500 B)  │ \n │
//! ├──────────────────────────────────────────────┼────┤
//! │ Slot 1: field;field;...   (padded to 500 B)  │ \n │
//! ├──────────────────────────────────────────────┼────┤
//! │ ...                                          │    │
//! └──────────────────────────────────────────────┴────┘
//!   offset(ordinal) = ordinal * 501
//! ```
//!
//! Index files use the same geometry, one `key;ordinal` pair per slot,
//! always sorted by key.

mod codec;
mod index;
mod log;
mod table;
mod txn;

pub use codec::{
    decode, decode_record, encode, encode_record, format_date, is_sentinel, parse_date,
    sentinel_slot, Record,
};
pub(crate) use codec::parse_field;
pub use index::{IndexKey, SortedIndex};
pub use log::{AppendLog, SlotIter};
pub use table::Table;
pub use txn::{commit_both, Participant, PendingWrite, Receipt};

// =============================================================================
// Slot Geometry (shared by codec, log, index)
// =============================================================================

/// Width of one encoded record in bytes, excluding the terminator
pub const SLOT_WIDTH: usize = 500;

/// Distance between consecutive slots: width plus the terminator
pub const SLOT_STRIDE: u64 = SLOT_WIDTH as u64 + 1;

/// Field separator inside a slot
pub const DELIMITER: char = ';';

/// Padding byte filling a slot past its encoded fields
pub const FILLER: u8 = b' ';

/// Byte written after every slot
pub const TERMINATOR: u8 = b'\n';

/// Literal overwriting a destroyed record
pub const SENTINEL: &str = "is_deleted";

/// On-disk date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";
