//! Catalog Store
//!
//! Car models, append-only. Ids are assigned sequentially from 1.

use std::path::Path;

use tracing::debug;

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::model::Model;
use crate::storage::{decode_record, encode_record, parse_field, Record, Table};

use super::live_records;

impl Record for Model {
    const FIELDS: usize = 3;

    fn to_fields(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.brand.clone()]
    }

    fn from_fields(fields: &[String]) -> Result<Self> {
        Ok(Model {
            id: parse_field(&fields[0], "model id")?,
            name: fields[1].clone(),
            brand: fields[2].clone(),
        })
    }
}

/// Catalog of car models (`models.txt` + `models_index.txt`)
pub struct CatalogStore {
    table: Table<u64>,
}

impl CatalogStore {
    pub const FILE_STEM: &'static str = "models";

    pub fn open(dir: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let table = Table::open(dir, Self::FILE_STEM, "model", sync_strategy)?;
        Ok(Self { table })
    }

    /// Store a model under the next id (row count + 1)
    ///
    /// Any id on the argument is ignored.
    pub fn add(&mut self, model: &Model) -> Result<Model> {
        let stored = Model {
            id: self.table.row_count() + 1,
            name: model.name.clone(),
            brand: model.brand.clone(),
        };

        let slot = encode_record(&stored)?;
        let ordinal = self.table.insert(stored.id, slot)?;

        debug!(id = stored.id, ordinal, name = %stored.name, "added model");
        Ok(stored)
    }

    pub fn get(&self, id: u64) -> Result<Model> {
        let (_, slot) = self.table.get(&id)?;
        decode_record(&slot)
    }

    /// All models in id order
    pub fn list(&self) -> Result<Vec<Model>> {
        live_records(&self.table).collect()
    }

    pub fn len(&self) -> u64 {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &Table<u64> {
        &self.table
    }
}
