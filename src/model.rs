//! Data Model
//!
//! Plain records handed to and returned from the stores. None of these carry
//! storage behavior; encoding lives with the store that owns each record.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DealerError, Result};

// =============================================================================
// Money
// =============================================================================

/// Currency amount with two decimal digits, stored as whole cents
///
/// Text form is always `units.cc` (e.g. `30000.00`), which is what lands in
/// the data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units, no cents; `None` if the amount overflows
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(100).map(Money)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DealerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DealerError::InvalidField(format!("invalid amount: {:?}", s));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || frac.len() > 2 || !all_digits(frac) {
            return Err(invalid());
        }

        let units: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A car model in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Assigned by the catalog on insert; 0 means "not yet stored"
    pub id: u64,
    pub name: String,
    pub brand: String,
}

impl Model {
    /// A model that hasn't been assigned an id yet
    pub fn new(name: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            brand: brand.into(),
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Lifecycle state of a car in inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    Available,
    Reserved,
    Sold,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Reserved => "reserved",
            CarStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = DealerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(CarStatus::Available),
            "reserved" => Ok(CarStatus::Reserved),
            "sold" => Ok(CarStatus::Sold),
            other => Err(DealerError::InvalidField(format!(
                "unknown car status: {:?}",
                other
            ))),
        }
    }
}

/// A vehicle in inventory, keyed by VIN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub vin: String,
    /// Catalog id of the car's model
    pub model: u64,
    pub price: Money,
    pub date_start: NaiveDate,
    pub status: CarStatus,
}

impl Car {
    pub fn new(
        vin: impl Into<String>,
        model: u64,
        price: Money,
        date_start: NaiveDate,
        status: CarStatus,
    ) -> Self {
        Self {
            vin: vin.into(),
            model,
            price,
            date_start,
            status,
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// A completed sale, keyed by its sales number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub sales_number: String,
    pub car_vin: String,
    pub cost: Money,
    pub sales_date: NaiveDate,
    /// Never persisted as a field: a deleted sale's slot is overwritten
    pub deleted: bool,
}

impl Sale {
    pub fn new(
        sales_number: impl Into<String>,
        car_vin: impl Into<String>,
        cost: Money,
        sales_date: NaiveDate,
    ) -> Self {
        Self {
            sales_number: sales_number.into(),
            car_vin: car_vin.into(),
            cost,
            sales_date,
            deleted: false,
        }
    }
}

// =============================================================================
// Query Projections
// =============================================================================

/// Car joined with its model and first active sale. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarFullInfo {
    pub vin: String,
    pub car_model_name: String,
    pub car_model_brand: String,
    pub price: Money,
    pub date_start: NaiveDate,
    pub status: CarStatus,
    pub sales_date: Option<NaiveDate>,
    pub sales_cost: Option<Money>,
}

/// Completed-sale tally for one model. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSaleStats {
    pub car_model_name: String,
    pub brand: String,
    pub sales_number: u64,
}
