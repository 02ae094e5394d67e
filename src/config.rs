//! Configuration for DealerDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{DealerError, Result};

/// Main configuration for a DealerDB instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── models.txt / models_index.txt
    ///     ├── cars.txt   / cars_index.txt
    ///     └── sales.txt  / sales_index.txt
    pub data_dir: PathBuf,

    /// Sync strategy: how often slot writes are fsynced
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Key Policy
    // -------------------------------------------------------------------------
    /// Reject `add_car` / `update_vin` when the VIN is already indexed
    pub enforce_unique_vins: bool,
}

/// Slot write sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every slot write (safest, slowest)
    EveryWrite,

    /// fsync after N slot writes
    EveryNWrites { count: usize },

    /// Leave flushing to the OS page cache
    OsManaged,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./dealerdb_data"),
            sync_strategy: SyncStrategy::OsManaged,
            enforce_unique_vins: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(DealerError::Config("data_dir must not be empty".to_string()));
        }
        if let SyncStrategy::EveryNWrites { count: 0 } = self.sync_strategy {
            return Err(DealerError::Config(
                "EveryNWrites count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enforce or relax VIN uniqueness
    pub fn enforce_unique_vins(mut self, enforce: bool) -> Self {
        self.config.enforce_unique_vins = enforce;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
