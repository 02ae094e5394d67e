//! DealerDB CLI
//!
//! Command-line interface over a dealership data directory.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dealerdb::storage::parse_date;
use dealerdb::{Car, CarStatus, Config, Dealership, Model, Money, Sale, SyncStrategy};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

/// DealerDB CLI
#[derive(Parser, Debug)]
#[command(name = "dealerdb")]
#[command(about = "Catalog, inventory, and sales records for a car dealership")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./dealerdb_data")]
    data_dir: String,

    /// fsync after every slot write
    #[arg(long)]
    fsync: bool,

    /// Let add-car / update-vin reuse a VIN that is already indexed
    #[arg(long)]
    allow_duplicate_vins: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a model to the catalog
    AddModel {
        /// Model name
        #[arg(long)]
        name: String,

        /// Brand name
        #[arg(long)]
        brand: String,
    },

    /// Add a car to inventory
    AddCar {
        #[arg(long)]
        vin: String,

        /// Catalog id of the car's model
        #[arg(long)]
        model: u64,

        /// Price, e.g. 30000.00
        #[arg(long)]
        price: Money,

        /// Date the car went on sale (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long, default_value = "available")]
        status: CarStatus,
    },

    /// Record a sale and mark the car sold
    Sell {
        /// Sales number
        #[arg(long)]
        number: String,

        #[arg(long)]
        vin: String,

        #[arg(long)]
        cost: Money,

        /// Sale date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Delete a sale and make the car available again
    Revert {
        /// Sales number
        number: String,
    },

    /// List cars with a given status
    Cars {
        #[arg(default_value = "available")]
        status: CarStatus,
    },

    /// List catalog models
    Models,

    /// Show a car with its model and sale
    Info {
        vin: String,
    },

    /// Change a car's VIN
    UpdateVin {
        vin: String,
        new_vin: String,
    },

    /// Best-selling models
    Top {
        #[arg(short, long, default_value_t = Dealership::DEFAULT_TOP_MODELS)]
        limit: usize,
    },
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays JSON)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,dealerdb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let sync_strategy = if args.fsync {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::OsManaged
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_strategy(sync_strategy)
        .enforce_unique_vins(!args.allow_duplicate_vins)
        .build();

    let mut dealership = match Dealership::open(config) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("Failed to open data directory {}: {}", args.data_dir, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut dealership, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(dealership: &mut Dealership, command: Commands) -> dealerdb::Result<()> {
    match command {
        Commands::AddModel { name, brand } => {
            print_json(&dealership.add_model(&Model::new(name, brand))?)
        }
        Commands::AddCar {
            vin,
            model,
            price,
            date,
            status,
        } => print_json(&dealership.add_car(&Car::new(vin, model, price, date, status))?),
        Commands::Sell {
            number,
            vin,
            cost,
            date,
        } => print_json(&dealership.sell(&Sale::new(number, vin, cost, date))?),
        Commands::Revert { number } => print_json(&dealership.revert_sale(&number)?),
        Commands::Cars { status } => print_json(&dealership.list_cars(status)?),
        Commands::Models => print_json(&dealership.list_models()?),
        Commands::Info { vin } => print_json(&dealership.car_info(&vin)?),
        Commands::UpdateVin { vin, new_vin } => {
            print_json(&dealership.update_vin(&vin, &new_vin)?)
        }
        Commands::Top { limit } => print_json(&dealership.top_models(limit)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> dealerdb::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| dealerdb::DealerError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
