//! Tests for Table and two-phase writes
//!
//! These tests verify:
//! - Each insert appends one slot and one index entry
//! - Keyed reads and NotFound reporting
//! - Commit / rollback of appends and overwrites
//! - commit_both backs out the first write when the second fails

use std::fs;
use std::path::PathBuf;

use dealerdb::storage::{
    commit_both, decode, encode, Participant, PendingWrite, Receipt, Table,
};
use dealerdb::{DealerError, Result, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf, Table<String>) {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();
    let table = Table::open(&dir, "things", "thing", SyncStrategy::OsManaged).unwrap();
    (temp_dir, dir, table)
}

fn slot(key: &str, value: &str) -> Vec<u8> {
    encode(&[key, value]).unwrap()
}

fn value_at(table: &Table<String>, key: &str) -> String {
    let (_, slot) = table.get(key).unwrap();
    decode(&slot).unwrap()[1].clone()
}

/// Participant whose commits always fail
struct Refuser;

impl Participant<String> for Refuser {
    fn commit(&mut self, _pending: PendingWrite<String>) -> Result<Receipt<String>> {
        Err(DealerError::MalformedRecord("refused".to_string()))
    }

    fn rollback(&mut self, _receipt: Receipt<String>) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_data_and_index_files() {
    let (_temp, dir, table) = setup_temp_table();

    assert!(dir.join("things.txt").exists());
    assert!(dir.join("things_index.txt").exists());
    assert_eq!(table.row_count(), 0);
    assert_eq!(table.kind(), "thing");
}

#[test]
fn test_insert_appends_and_indexes() {
    let (_temp, _dir, mut table) = setup_temp_table();

    assert_eq!(table.insert("b".to_string(), slot("b", "1")).unwrap(), 0);
    assert_eq!(table.insert("a".to_string(), slot("a", "2")).unwrap(), 1);

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.index().len(), 2);
    assert_eq!(table.ordinal_of("a").unwrap(), 1);
    assert_eq!(value_at(&table, "b"), "1");
}

#[test]
fn test_get_missing_key_is_not_found() {
    let (_temp, _dir, table) = setup_temp_table();

    match table.get("ghost") {
        Err(DealerError::NotFound { kind, key }) => {
            assert_eq!(kind, "thing");
            assert_eq!(key, "ghost");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_rekey_missing_key_is_not_found() {
    let (_temp, _dir, mut table) = setup_temp_table();

    let result = table.rekey("ghost", "spirit".to_string());
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_reopen_sees_previous_rows() {
    let (_temp, dir, mut table) = setup_temp_table();
    table.insert("k".to_string(), slot("k", "v")).unwrap();
    drop(table);

    let table: Table<String> = Table::open(&dir, "things", "thing", SyncStrategy::OsManaged).unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(value_at(&table, "k"), "v");
}

// =============================================================================
// Commit / Rollback Tests
// =============================================================================

#[test]
fn test_rollback_append_restores_previous_state() {
    let (_temp, _dir, mut table) = setup_temp_table();
    table.insert("k".to_string(), slot("k", "old")).unwrap();

    let receipt = table
        .commit(PendingWrite::Append {
            key: "k".to_string(),
            slot: slot("k", "new"),
        })
        .unwrap();
    assert_eq!(receipt.ordinal, 1);
    assert_eq!(receipt.replaced, Some(0));
    assert_eq!(value_at(&table, "k"), "new");

    table.rollback(receipt).unwrap();

    assert_eq!(table.row_count(), 1);
    assert_eq!(table.ordinal_of("k").unwrap(), 0);
    assert_eq!(value_at(&table, "k"), "old");
}

#[test]
fn test_rollback_fresh_append_removes_key() {
    let (_temp, _dir, mut table) = setup_temp_table();

    let receipt = table
        .commit(PendingWrite::Append {
            key: "k".to_string(),
            slot: slot("k", "v"),
        })
        .unwrap();
    table.rollback(receipt).unwrap();

    assert_eq!(table.row_count(), 0);
    assert!(!table.contains("k"));
    assert_eq!(table.log().file_len().unwrap(), 0);
}

#[test]
fn test_failed_index_write_undoes_append() {
    let (_temp, dir, mut table) = setup_temp_table();
    table.insert("a".to_string(), slot("a", "1")).unwrap();
    let len_before = table.log().file_len().unwrap();

    let blocker = dir.join("things_index.tmp");
    fs::create_dir(&blocker).unwrap();

    let result = table.insert("b".to_string(), slot("b", "2"));

    assert!(matches!(result, Err(DealerError::Io(_))));
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.log().file_len().unwrap(), len_before);
    assert!(!table.contains("b"));
    assert_eq!(table.index().len(), 1);

    // The freed ordinal goes to the next key only
    fs::remove_dir(&blocker).unwrap();
    assert_eq!(table.insert("c".to_string(), slot("c", "3")).unwrap(), 1);
    assert!(table.get("b").unwrap_err().is_not_found());
    assert_eq!(value_at(&table, "c"), "3");
    assert_eq!(value_at(&table, "a"), "1");
}

#[test]
fn test_rollback_overwrite_restores_before_image() {
    let (_temp, _dir, mut table) = setup_temp_table();
    table.insert("k".to_string(), slot("k", "before")).unwrap();

    let pending = table.prepare_overwrite(0, slot("k", "after")).unwrap();
    let receipt = table.commit(pending).unwrap();
    assert_eq!(value_at(&table, "k"), "after");

    table.rollback(receipt).unwrap();
    assert_eq!(value_at(&table, "k"), "before");
}

#[test]
fn test_prepare_overwrite_writes_nothing() {
    let (_temp, _dir, mut table) = setup_temp_table();
    table.insert("k".to_string(), slot("k", "before")).unwrap();

    let _pending = table.prepare_overwrite(0, slot("k", "after")).unwrap();

    assert_eq!(value_at(&table, "k"), "before");
    assert!(table.prepare_overwrite(1, slot("k", "x")).is_err());
}

#[test]
fn test_commit_both_rolls_back_first_on_failure() {
    let (_temp, _dir, mut table) = setup_temp_table();
    table.insert("k".to_string(), slot("k", "before")).unwrap();
    let len_before = table.log().file_len().unwrap();

    let append = PendingWrite::Append {
        key: "new".to_string(),
        slot: slot("new", "v"),
    };
    let other = PendingWrite::Append {
        key: "x".to_string(),
        slot: slot("x", "v"),
    };

    let result = commit_both(&mut table, append, &mut Refuser, other);

    assert!(matches!(result, Err(DealerError::MalformedRecord(_))));
    assert_eq!(table.row_count(), 1);
    assert!(!table.contains("new"));
    assert_eq!(table.log().file_len().unwrap(), len_before);
}

#[test]
fn test_commit_both_applies_both() {
    let temp_dir = TempDir::new().unwrap();
    let mut left: Table<String> =
        Table::open(temp_dir.path(), "left", "left", SyncStrategy::OsManaged).unwrap();
    let mut right: Table<u64> =
        Table::open(temp_dir.path(), "right", "right", SyncStrategy::OsManaged).unwrap();

    let (a, b) = commit_both(
        &mut left,
        PendingWrite::Append {
            key: "L".to_string(),
            slot: slot("L", "1"),
        },
        &mut right,
        PendingWrite::Append {
            key: 7,
            slot: slot("7", "2"),
        },
    )
    .unwrap();

    assert_eq!(a.ordinal, 0);
    assert_eq!(b.ordinal, 0);
    assert!(left.contains("L"));
    assert!(right.contains(&7));
}
