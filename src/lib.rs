//! # DealerDB
//!
//! A small record store for a car dealership with:
//! - Fixed-width slot files addressed by ordinal (O(1) seek)
//! - Sorted side indexes mapping natural keys to slot ordinals
//! - In-place status updates, VIN rekeys, and destructive soft deletes
//! - Join and aggregate queries across catalog, inventory, and sales
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Dealership (engine)                     │
//! │        sell / revert_sale / car_info / top_models           │
//! └──────────────┬──────────────────┬──────────────────┬────────┘
//!                │                  │                  │
//!                ▼                  ▼                  ▼
//!        ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!        │ CatalogStore │   │InventoryStore│   │  SalesStore  │
//!        │  (models)    │   │   (cars)     │   │   (sales)    │
//!        └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!               └──────────────────┼──────────────────┘
//!                                  ▼
//!                     ┌─────────────────────────┐
//!                     │  Table = AppendLog +    │
//!                     │          SortedIndex    │
//!                     └────────────┬────────────┘
//!                                  ▼
//!                     ┌─────────────────────────┐
//!                     │   Fixed-Width Codec     │
//!                     │  (500 B slot + '\n')    │
//!                     └─────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod model;

pub mod storage;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DealerError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::Dealership;
pub use model::{Car, CarFullInfo, CarStatus, Model, ModelSaleStats, Money, Sale};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DealerDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
