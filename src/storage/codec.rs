//! Fixed-Width Codec
//!
//! Joins fields with `;`, pads to `SLOT_WIDTH` with spaces, and reverses it.
//!
//! Decoding trims trailing filler, so a value is only stored losslessly if it
//! holds no delimiter or newline and the final field doesn't end in filler.
//! `encode` rejects anything else up front.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{DealerError, Result};

use super::{DATE_FORMAT, DELIMITER, FILLER, SENTINEL, SLOT_WIDTH};

/// A record type that maps to an ordered list of text fields
pub trait Record: Sized {
    /// Number of fields in the encoded form
    const FIELDS: usize;

    fn to_fields(&self) -> Vec<String>;

    /// Build from exactly `FIELDS` decoded fields
    fn from_fields(fields: &[String]) -> Result<Self>;
}

// =============================================================================
// Raw Field Encoding
// =============================================================================

/// Encode fields into one slot of exactly `SLOT_WIDTH` bytes
pub fn encode<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>> {
    for field in fields {
        let field = field.as_ref();
        if field.contains(DELIMITER) || field.contains('\n') || field.contains('\r') {
            return Err(DealerError::InvalidField(format!(
                "field {:?} contains a delimiter or line break",
                field
            )));
        }
    }

    if let Some(last) = fields.last() {
        if last.as_ref().as_bytes().last() == Some(&FILLER) {
            return Err(DealerError::InvalidField(format!(
                "final field {:?} ends with padding",
                last.as_ref()
            )));
        }
    }

    let mut joined = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            joined.push(DELIMITER);
        }
        joined.push_str(field.as_ref());
    }

    if joined.len() > SLOT_WIDTH {
        return Err(DealerError::RecordTooLarge {
            len: joined.len(),
            max: SLOT_WIDTH,
        });
    }

    let mut slot = Vec::with_capacity(SLOT_WIDTH);
    slot.extend_from_slice(joined.as_bytes());
    slot.resize(SLOT_WIDTH, FILLER);
    Ok(slot)
}

/// Decode a slot back into its fields
pub fn decode(slot: &[u8]) -> Result<Vec<String>> {
    let text = std::str::from_utf8(slot)
        .map_err(|e| DealerError::MalformedRecord(format!("slot is not UTF-8: {}", e)))?;

    Ok(text
        .trim_end_matches(FILLER as char)
        .split(DELIMITER)
        .map(str::to_string)
        .collect())
}

// =============================================================================
// Typed Records
// =============================================================================

pub fn encode_record<R: Record>(record: &R) -> Result<Vec<u8>> {
    encode(&record.to_fields())
}

/// Decode a slot into `R`, failing on a field count mismatch
pub fn decode_record<R: Record>(slot: &[u8]) -> Result<R> {
    let fields = decode(slot)?;
    if fields.len() != R::FIELDS {
        return Err(DealerError::MalformedRecord(format!(
            "expected {} fields, got {}",
            R::FIELDS,
            fields.len()
        )));
    }
    R::from_fields(&fields)
}

/// Parse one stored field, reporting failures as a malformed record
pub(crate) fn parse_field<T>(raw: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse()
        .map_err(|e| DealerError::MalformedRecord(format!("bad {} {:?}: {}", name, raw, e)))
}

// =============================================================================
// Sentinel and Field Formats
// =============================================================================

/// True if the slot holds only the deletion sentinel
pub fn is_sentinel(slot: &[u8]) -> bool {
    match slot.strip_prefix(SENTINEL.as_bytes()) {
        Some(rest) => rest.iter().all(|&b| b == FILLER),
        None => false,
    }
}

/// A full slot holding the deletion sentinel
pub fn sentinel_slot() -> Vec<u8> {
    let mut slot = Vec::with_capacity(SLOT_WIDTH);
    slot.extend_from_slice(SENTINEL.as_bytes());
    slot.resize(SLOT_WIDTH, FILLER);
    slot
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a caller-supplied `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DealerError::InvalidField(format!("invalid date {:?}: {}", raw, e)))
}
