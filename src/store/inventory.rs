//! Inventory Store
//!
//! Cars keyed by VIN. New cars are appended; status changes and VIN rekeys
//! overwrite the car's slot in place.

use std::path::Path;

use tracing::debug;

use crate::config::SyncStrategy;
use crate::error::{DealerError, Result};
use crate::model::{Car, CarStatus};
use crate::storage::{
    decode_record, encode_record, format_date, parse_field, Participant, PendingWrite, Receipt,
    Record, Table,
};

use super::{check_key, live_records};

impl Record for Car {
    const FIELDS: usize = 5;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.vin.clone(),
            self.model.to_string(),
            self.price.to_string(),
            format_date(&self.date_start),
            self.status.to_string(),
        ]
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Car {
            vin: fields[0].clone(),
            model: parse_field(&fields[1], "model id")?,
            price: parse_field(&fields[2], "price")?,
            date_start: parse_field(&fields[3], "date")?,
            status: parse_field(&fields[4], "status")?,
        })
    }
}

/// Cars on the lot (`cars.txt` + `cars_index.txt`)
pub struct InventoryStore {
    table: Table<String>,
    enforce_unique_vins: bool,
}

impl InventoryStore {
    pub const FILE_STEM: &'static str = "cars";

    pub fn open(dir: &Path, sync_strategy: SyncStrategy, enforce_unique_vins: bool) -> Result<Self> {
        let table = Table::open(dir, Self::FILE_STEM, "car", sync_strategy)?;
        Ok(Self {
            table,
            enforce_unique_vins,
        })
    }

    /// Append a car and index its VIN
    pub fn add(&mut self, car: &Car) -> Result<Car> {
        check_key("car", &car.vin)?;
        self.check_vin_free(&car.vin)?;

        let slot = encode_record(car)?;
        let ordinal = self.table.insert(car.vin.clone(), slot)?;

        debug!(vin = %car.vin, ordinal, "added car");
        Ok(car.clone())
    }

    pub fn find(&self, vin: &str) -> Result<Car> {
        let (_, slot) = self.table.get(vin)?;
        decode_record(&slot)
    }

    pub fn contains(&self, vin: &str) -> bool {
        self.table.contains(vin)
    }

    /// Cars with `status`, in file order
    pub fn list_by_status(&self, status: CarStatus) -> Result<Vec<Car>> {
        live_records::<_, Car>(&self.table)
            .filter(|item| match item {
                Ok(car) => car.status == status,
                Err(_) => true,
            })
            .collect()
    }

    /// Change a car's status in place
    pub fn set_status(&mut self, vin: &str, status: CarStatus) -> Result<Car> {
        let (car, pending) = self.prepare_status(vin, status)?;
        self.table.commit(pending)?;

        debug!(vin, %status, "set car status");
        Ok(car)
    }

    /// Stage a status change without writing it
    ///
    /// Returns the car as it will read after the write.
    pub fn prepare_status(
        &self,
        vin: &str,
        status: CarStatus,
    ) -> Result<(Car, PendingWrite<String>)> {
        let (ordinal, before) = self.table.get(vin)?;
        let mut car: Car = decode_record(&before)?;
        car.status = status;

        let after = encode_record(&car)?;
        Ok((
            car,
            PendingWrite::Overwrite {
                ordinal,
                before,
                after,
            },
        ))
    }

    /// Replace a car's VIN: rewrite its slot, then move its index entry
    pub fn rekey(&mut self, old_vin: &str, new_vin: &str) -> Result<Car> {
        check_key("car", new_vin)?;
        let (ordinal, before) = self.table.get(old_vin)?;
        if old_vin == new_vin {
            return decode_record(&before);
        }
        self.check_vin_free(new_vin)?;

        let mut car: Car = decode_record(&before)?;
        car.vin = new_vin.to_string();
        let after = encode_record(&car)?;

        self.table.overwrite(ordinal, &after)?;
        if let Err(err) = self.table.rekey(old_vin, new_vin.to_string()) {
            self.table.overwrite(ordinal, &before)?;
            return Err(err);
        }

        debug!(old_vin, new_vin, ordinal, "rekeyed car");
        Ok(car)
    }

    pub fn len(&self) -> u64 {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &Table<String> {
        &self.table
    }

    fn check_vin_free(&self, vin: &str) -> Result<()> {
        if self.enforce_unique_vins && self.table.contains(vin) {
            return Err(DealerError::DuplicateKey {
                kind: "car",
                key: vin.to_string(),
            });
        }
        Ok(())
    }
}

impl Participant<String> for InventoryStore {
    fn commit(&mut self, pending: PendingWrite<String>) -> Result<Receipt<String>> {
        self.table.commit(pending)
    }

    fn rollback(&mut self, receipt: Receipt<String>) -> Result<()> {
        self.table.rollback(receipt)
    }
}
