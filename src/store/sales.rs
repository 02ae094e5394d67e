//! Sales Store
//!
//! Sales keyed by sales number. Deleting a sale overwrites its whole slot
//! with the sentinel, so the original fields are gone afterwards; callers
//! that need them (e.g. the VIN) get them back from [`SalesStore::soft_delete`].

use std::path::Path;

use tracing::debug;

use crate::config::SyncStrategy;
use crate::error::{DealerError, Result};
use crate::model::Sale;
use crate::storage::{
    decode_record, encode_record, format_date, is_sentinel, parse_field, sentinel_slot,
    Participant, PendingWrite, Receipt, Record, Table,
};

use super::{check_key, live_records};

impl Record for Sale {
    const FIELDS: usize = 4;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.sales_number.clone(),
            self.car_vin.clone(),
            self.cost.to_string(),
            format_date(&self.sales_date),
        ]
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Sale {
            sales_number: fields[0].clone(),
            car_vin: fields[1].clone(),
            cost: parse_field(&fields[2], "cost")?,
            sales_date: parse_field(&fields[3], "sales date")?,
            deleted: false,
        })
    }
}

/// Transaction log of sales (`sales.txt` + `sales_index.txt`)
pub struct SalesStore {
    table: Table<String>,
}

impl SalesStore {
    pub const FILE_STEM: &'static str = "sales";

    pub fn open(dir: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let table = Table::open(dir, Self::FILE_STEM, "sale", sync_strategy)?;
        Ok(Self { table })
    }

    /// Append a sale. Sales numbers aren't checked for uniqueness; a repeat
    /// repoints the index at the newer row.
    pub fn add(&mut self, sale: &Sale) -> Result<Sale> {
        let pending = self.prepare_add(sale)?;
        let receipt = self.table.commit(pending)?;

        debug!(sales_number = %sale.sales_number, ordinal = receipt.ordinal, "added sale");
        Ok(Sale {
            deleted: false,
            ..sale.clone()
        })
    }

    /// Stage an append without writing it
    pub fn prepare_add(&self, sale: &Sale) -> Result<PendingWrite<String>> {
        check_key("sale", &sale.sales_number)?;
        let slot = encode_record(sale)?;
        Ok(PendingWrite::Append {
            key: sale.sales_number.clone(),
            slot,
        })
    }

    /// Point read; a sentinel slot is reported as `AlreadyDeleted`
    pub fn find(&self, sales_number: &str) -> Result<Sale> {
        let (_, slot) = self.table.get(sales_number)?;
        if is_sentinel(&slot) {
            return Err(DealerError::AlreadyDeleted(sales_number.to_string()));
        }
        decode_record(&slot)
    }

    /// Destroy a sale's slot
    ///
    /// Returns the sale as it was just before the overwrite, flagged deleted.
    pub fn soft_delete(&mut self, sales_number: &str) -> Result<Sale> {
        let (sale, pending) = self.prepare_delete(sales_number)?;
        self.table.commit(pending)?;

        debug!(sales_number, vin = %sale.car_vin, "deleted sale");
        Ok(sale)
    }

    /// Stage a soft delete, capturing the sale before it's destroyed
    pub fn prepare_delete(&self, sales_number: &str) -> Result<(Sale, PendingWrite<String>)> {
        let (ordinal, before) = self.table.get(sales_number)?;
        if is_sentinel(&before) {
            return Err(DealerError::AlreadyDeleted(sales_number.to_string()));
        }

        let mut sale: Sale = decode_record(&before)?;
        sale.deleted = true;

        Ok((
            sale,
            PendingWrite::Overwrite {
                ordinal,
                before,
                after: sentinel_slot(),
            },
        ))
    }

    /// Every sale that hasn't been deleted, in file order
    pub fn scan_active(&self) -> Result<Vec<Sale>> {
        live_records(&self.table).collect()
    }

    /// First live sale for `vin` in file order (not necessarily the latest)
    pub fn first_active_for_vin(&self, vin: &str) -> Result<Option<Sale>> {
        for item in live_records::<_, Sale>(&self.table) {
            let sale = item?;
            if sale.car_vin == vin {
                return Ok(Some(sale));
            }
        }
        Ok(None)
    }

    /// Rows in the sales file, deleted ones included
    pub fn len(&self) -> u64 {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &Table<String> {
        &self.table
    }
}

impl Participant<String> for SalesStore {
    fn commit(&mut self, pending: PendingWrite<String>) -> Result<Receipt<String>> {
        self.table.commit(pending)
    }

    fn rollback(&mut self, receipt: Receipt<String>) -> Result<()> {
        self.table.rollback(receipt)
    }
}
