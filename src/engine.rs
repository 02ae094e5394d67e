//! Engine Module
//!
//! The dealership engine that coordinates the three stores.
//!
//! ## Responsibilities
//! - Own the catalog, inventory, and sales stores under one data directory
//! - Run cross-store mutations (`sell`, `revert_sale`) as staged two-phase
//!   writes
//! - Answer join and aggregate queries (`car_info`, `top_models`)

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DealerError, Result};
use crate::model::{Car, CarFullInfo, CarStatus, Model, ModelSaleStats, Sale};
use crate::storage::commit_both;
use crate::store::{CatalogStore, InventoryStore, SalesStore};

/// The main dealership engine
///
/// ## Concurrency Model: single caller
///
/// Every method runs its file I/O synchronously to completion. Mutations
/// take `&mut self`; callers sharing an engine across threads must
/// serialize access themselves. Nothing here guards against another process
/// touching the same files.
pub struct Dealership {
    /// Engine configuration
    config: Config,

    /// Car models
    catalog: CatalogStore,

    /// Cars, keyed by VIN
    inventory: InventoryStore,

    /// Sales, keyed by sales number
    sales: SalesStore,
}

impl Dealership {
    /// Default number of entries returned by `top_models`
    pub const DEFAULT_TOP_MODELS: usize = 3;

    /// Open or create a dealership with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open each store (data file + index, torn tails trimmed)
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let dir = config.data_dir.as_path();
        let catalog = CatalogStore::open(dir, config.sync_strategy)?;
        let inventory =
            InventoryStore::open(dir, config.sync_strategy, config.enforce_unique_vins)?;
        let sales = SalesStore::open(dir, config.sync_strategy)?;

        info!(
            data_dir = %dir.display(),
            models = catalog.len(),
            cars = inventory.len(),
            sales = sales.len(),
            "dealership opened"
        );

        Ok(Self {
            config,
            catalog,
            inventory,
            sales,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Catalog and Inventory
    // =========================================================================

    /// Store a model; the returned copy carries its assigned id
    pub fn add_model(&mut self, model: &Model) -> Result<Model> {
        self.catalog.add(model)
    }

    pub fn add_car(&mut self, car: &Car) -> Result<Car> {
        self.inventory.add(car)
    }

    pub fn find_model(&self, id: u64) -> Result<Model> {
        self.catalog.get(id)
    }

    pub fn list_models(&self) -> Result<Vec<Model>> {
        self.catalog.list()
    }

    pub fn find_car(&self, vin: &str) -> Result<Car> {
        self.inventory.find(vin)
    }

    /// Cars with `status`, in the order they were added
    pub fn list_cars(&self, status: CarStatus) -> Result<Vec<Car>> {
        self.inventory.list_by_status(status)
    }

    /// Change a car's VIN
    pub fn update_vin(&mut self, vin: &str, new_vin: &str) -> Result<Car> {
        self.inventory.rekey(vin, new_vin)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Record a sale and mark its car sold
    ///
    /// Both writes are staged first, so an unknown VIN fails before anything
    /// is written. If marking the car fails, the sale append is undone.
    pub fn sell(&mut self, sale: &Sale) -> Result<Car> {
        let pending_sale = self.sales.prepare_add(sale)?;
        let (car, pending_status) = self
            .inventory
            .prepare_status(&sale.car_vin, CarStatus::Sold)?;

        commit_both(
            &mut self.sales,
            pending_sale,
            &mut self.inventory,
            pending_status,
        )?;

        info!(sales_number = %sale.sales_number, vin = %car.vin, cost = %sale.cost, "car sold");
        Ok(car)
    }

    /// Delete a sale and put its car back on sale
    ///
    /// The VIN is read from the sale before its slot is destroyed.
    pub fn revert_sale(&mut self, sales_number: &str) -> Result<Car> {
        let (sale, pending_delete) = self.sales.prepare_delete(sales_number)?;
        let (car, pending_status) = self
            .inventory
            .prepare_status(&sale.car_vin, CarStatus::Available)?;

        commit_both(
            &mut self.sales,
            pending_delete,
            &mut self.inventory,
            pending_status,
        )?;

        info!(sales_number, vin = %car.vin, "sale reverted");
        Ok(car)
    }

    pub fn find_sale(&self, sales_number: &str) -> Result<Sale> {
        self.sales.find(sales_number)
    }

    /// Sales that haven't been reverted, in file order
    pub fn active_sales(&self) -> Result<Vec<Sale>> {
        self.sales.scan_active()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Car joined with its model and its first live sale in file order
    pub fn car_info(&self, vin: &str) -> Result<CarFullInfo> {
        let car = self.inventory.find(vin)?;
        let model = self.catalog.get(car.model)?;
        let sale = self.sales.first_active_for_vin(&car.vin)?;

        Ok(CarFullInfo {
            vin: car.vin,
            car_model_name: model.name,
            car_model_brand: model.brand,
            price: car.price,
            date_start: car.date_start,
            status: car.status,
            sales_date: sale.as_ref().map(|s| s.sales_date),
            sales_cost: sale.as_ref().map(|s| s.cost),
        })
    }

    /// Best-selling models by live sale count
    ///
    /// Ordered by count descending, then model name and brand ascending.
    /// Sales whose VIN is gone from inventory and models missing from the
    /// catalog are left out.
    pub fn top_models(&self, limit: usize) -> Result<Vec<ModelSaleStats>> {
        let mut tally: HashMap<u64, u64> = HashMap::new();

        for sale in self.sales.scan_active()? {
            match self.inventory.find(&sale.car_vin) {
                Ok(car) => *tally.entry(car.model).or_insert(0) += 1,
                Err(err @ (DealerError::NotFound { .. } | DealerError::MalformedRecord(_))) => {
                    warn!(sales_number = %sale.sales_number, error = %err, "sale skipped in tally");
                }
                Err(err) => return Err(err),
            }
        }

        let mut stats = Vec::with_capacity(tally.len());
        for (model_id, count) in tally {
            match self.catalog.get(model_id) {
                Ok(model) => stats.push(ModelSaleStats {
                    car_model_name: model.name,
                    brand: model.brand,
                    sales_number: count,
                }),
                Err(err @ (DealerError::NotFound { .. } | DealerError::MalformedRecord(_))) => {
                    warn!(model_id, error = %err, "model skipped in tally");
                }
                Err(err) => return Err(err),
            }
        }

        stats.sort_by(|a, b| {
            b.sales_number
                .cmp(&a.sales_number)
                .then_with(|| a.car_model_name.cmp(&b.car_model_name))
                .then_with(|| a.brand.cmp(&b.brand))
        });
        stats.truncate(limit);

        Ok(stats)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn sales(&self) -> &SalesStore {
        &self.sales
    }
}
