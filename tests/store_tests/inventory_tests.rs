//! Tests for InventoryStore
//!
//! These tests verify:
//! - Adding and finding cars by VIN
//! - Status listing in file order, skipping malformed slots
//! - In-place status changes
//! - VIN rekeys and the uniqueness policy

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use dealerdb::storage::{encode, AppendLog};
use dealerdb::store::InventoryStore;
use dealerdb::{Car, CarStatus, DealerError, Money, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_inventory() -> (TempDir, InventoryStore) {
    let temp_dir = TempDir::new().unwrap();
    let inventory = InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
    (temp_dir, inventory)
}

fn car(vin: &str, model: u64, status: CarStatus) -> Car {
    Car::new(
        vin,
        model,
        Money::from_units(30000).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        status,
    )
}

fn cars_file(dir: &Path) -> AppendLog {
    AppendLog::open(&dir.join("cars.txt"), SyncStrategy::OsManaged).unwrap()
}

// =============================================================================
// Add / Find Tests
// =============================================================================

#[test]
fn test_add_and_find() {
    let (_temp, mut inventory) = setup_temp_inventory();

    let added = inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();
    let found = inventory.find("VIN1").unwrap();

    assert_eq!(added, found);
    assert_eq!(found.price.to_string(), "30000.00");
    assert_eq!(inventory.len(), 1);
}

#[test]
fn test_find_unknown_vin() {
    let (_temp, inventory) = setup_temp_inventory();

    match inventory.find("NOPE") {
        Err(DealerError::NotFound { kind, key }) => {
            assert_eq!(kind, "car");
            assert_eq!(key, "NOPE");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_add_rejects_duplicate_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();

    let result = inventory.add(&car("VIN1", 2, CarStatus::Available));

    assert!(matches!(result, Err(DealerError::DuplicateKey { .. })));
    assert_eq!(inventory.len(), 1);
}

#[test]
fn test_relaxed_mode_repoints_duplicate_vin() {
    let temp_dir = TempDir::new().unwrap();
    let mut inventory =
        InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, false).unwrap();

    inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("VIN1", 2, CarStatus::Available)).unwrap();

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.table().index().len(), 1);
    assert_eq!(inventory.find("VIN1").unwrap().model, 2);
}

#[test]
fn test_add_rejects_unstorable_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();

    assert!(matches!(
        inventory.add(&car("", 1, CarStatus::Available)),
        Err(DealerError::InvalidField(_))
    ));
    assert!(matches!(
        inventory.add(&car("VIN;1", 1, CarStatus::Available)),
        Err(DealerError::InvalidField(_))
    ));
    assert!(inventory.is_empty());
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_by_status_filters_in_file_order() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("C", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("A", 1, CarStatus::Sold)).unwrap();
    inventory.add(&car("B", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("D", 1, CarStatus::Reserved)).unwrap();

    let available: Vec<String> = inventory
        .list_by_status(CarStatus::Available)
        .unwrap()
        .into_iter()
        .map(|c| c.vin)
        .collect();

    assert_eq!(available, vec!["C", "B"]);
    assert_eq!(inventory.list_by_status(CarStatus::Reserved).unwrap().len(), 1);
}

#[test]
fn test_list_skips_malformed_slots() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut inventory =
            InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
        inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();
    }
    {
        let mut raw = cars_file(temp_dir.path());
        raw.append(&encode(&["garbage", "row"]).unwrap()).unwrap();
    }

    let mut inventory =
        InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
    inventory.add(&car("VIN2", 1, CarStatus::Available)).unwrap();

    let vins: Vec<String> = inventory
        .list_by_status(CarStatus::Available)
        .unwrap()
        .into_iter()
        .map(|c| c.vin)
        .collect();
    assert_eq!(vins, vec!["VIN1", "VIN2"]);
}

#[test]
fn test_point_read_of_malformed_slot_fails() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut inventory =
            InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
        inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();
    }
    {
        let mut raw = cars_file(temp_dir.path());
        raw.overwrite_at(0, &encode(&["VIN1", "broken"]).unwrap()).unwrap();
    }

    let inventory = InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
    assert!(matches!(
        inventory.find("VIN1"),
        Err(DealerError::MalformedRecord(_))
    ));
}

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_set_status_overwrites_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let mut inventory =
        InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
    inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("VIN2", 1, CarStatus::Available)).unwrap();
    let len_before = inventory.table().log().file_len().unwrap();

    let updated = inventory.set_status("VIN1", CarStatus::Sold).unwrap();

    assert_eq!(updated.status, CarStatus::Sold);
    assert_eq!(inventory.find("VIN1").unwrap().status, CarStatus::Sold);
    assert_eq!(inventory.find("VIN2").unwrap().status, CarStatus::Available);
    assert_eq!(inventory.table().log().file_len().unwrap(), len_before);
    assert_eq!(inventory.len(), 2);
}

#[test]
fn test_set_status_unknown_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();

    let result = inventory.set_status("NOPE", CarStatus::Sold);
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_prepare_status_writes_nothing() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("VIN1", 1, CarStatus::Available)).unwrap();

    let (preview, _pending) = inventory.prepare_status("VIN1", CarStatus::Sold).unwrap();

    assert_eq!(preview.status, CarStatus::Sold);
    assert_eq!(inventory.find("VIN1").unwrap().status, CarStatus::Available);
}

// =============================================================================
// Rekey Tests
// =============================================================================

#[test]
fn test_rekey_changes_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("AAA", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("MMM", 2, CarStatus::Sold)).unwrap();

    let updated = inventory.rekey("AAA", "ZZZ").unwrap();

    assert_eq!(updated.vin, "ZZZ");
    assert_eq!(updated.model, 1);
    assert!(inventory.find("AAA").unwrap_err().is_not_found());
    assert_eq!(inventory.find("ZZZ").unwrap(), updated);

    // Same slot, new key, index re-sorted
    assert_eq!(inventory.table().ordinal_of("ZZZ").unwrap(), 0);
    let keys: Vec<&String> = inventory.table().index().keys().collect();
    assert_eq!(keys, vec!["MMM", "ZZZ"]);
    assert_eq!(inventory.len(), 2);
}

#[test]
fn test_rekey_unknown_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();

    assert!(inventory.rekey("NOPE", "NEW").unwrap_err().is_not_found());
}

#[test]
fn test_rekey_unknown_vin_onto_existing_vin() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("B", 2, CarStatus::Available)).unwrap();

    assert!(inventory.rekey("NOPE", "B").unwrap_err().is_not_found());
}

#[test]
fn test_rekey_restores_slot_when_index_write_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut inventory =
        InventoryStore::open(temp_dir.path(), SyncStrategy::OsManaged, true).unwrap();
    inventory.add(&car("A", 1, CarStatus::Available)).unwrap();

    let blocker = temp_dir.path().join("cars_index.tmp");
    fs::create_dir(&blocker).unwrap();

    let result = inventory.rekey("A", "Z");

    assert!(matches!(result, Err(DealerError::Io(_))));
    assert_eq!(inventory.find("A").unwrap().vin, "A");
    assert!(inventory.find("Z").unwrap_err().is_not_found());
    assert_eq!(inventory.table().ordinal_of("A").unwrap(), 0);

    fs::remove_dir(&blocker).unwrap();
    assert_eq!(inventory.rekey("A", "Z").unwrap().vin, "Z");
}

#[test]
fn test_rekey_onto_existing_vin_rejected() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("A", 1, CarStatus::Available)).unwrap();
    inventory.add(&car("B", 2, CarStatus::Available)).unwrap();

    let result = inventory.rekey("A", "B");

    assert!(matches!(result, Err(DealerError::DuplicateKey { .. })));
    assert_eq!(inventory.find("A").unwrap().model, 1);
    assert_eq!(inventory.find("B").unwrap().model, 2);
}

#[test]
fn test_rekey_to_same_vin_is_noop() {
    let (_temp, mut inventory) = setup_temp_inventory();
    inventory.add(&car("A", 1, CarStatus::Available)).unwrap();

    let same = inventory.rekey("A", "A").unwrap();

    assert_eq!(same.vin, "A");
    assert_eq!(inventory.table().index().len(), 1);
}
