mod cli;
mod console;
mod menu;
mod reports;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use garage_core::{
    registration, validate, workflow, Allocator, Customer, EntityKind, MaxIdAllocator, Mechanic,
    Session, ShopStore, Snapshot, SqliteStore, Vehicle, VinPolicy,
};

use crate::cli::{Cli, Command, ReportCommand};
use crate::console::StdinConsole;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = determine_db_path(cli.db.clone())?;
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open shop database at {:?}", db_path))?;
    let vin = VinPolicy {
        length: cli.vin_length,
    };

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => menu::run(&store, vin),
        Command::AddCustomer {
            first_name,
            last_name,
            phone,
            address,
        } => {
            let interactive = first_name.is_none()
                && last_name.is_none()
                && phone.is_none()
                && address.is_none();
            if interactive {
                with_session(&store, vin, |s| {
                    registration::register_customer(s).map(|_| ())
                })
            } else {
                add_customer_cli(&store, &first_name, &last_name, &phone, &address)
            }
        }
        Command::AddMechanic {
            first_name,
            last_name,
            experience,
        } => {
            let interactive =
                first_name.is_none() && last_name.is_none() && experience.is_none();
            if interactive {
                with_session(&store, vin, |s| {
                    registration::register_mechanic(s).map(|_| ())
                })
            } else {
                add_mechanic_cli(&store, &first_name, &last_name, &experience)
            }
        }
        Command::AddVehicle {
            vin: vin_arg,
            make,
            model,
            year,
        } => {
            let interactive =
                vin_arg.is_none() && make.is_none() && model.is_none() && year.is_none();
            if interactive {
                with_session(&store, vin, |s| {
                    registration::register_vehicle(s).map(|_| ())
                })
            } else {
                add_vehicle_cli(&store, vin, &vin_arg, &make, &model, &year)
            }
        }
        Command::Intake => with_session(&store, vin, |s| workflow::run_intake(s).map(|_| ())),
        Command::Close => with_session(&store, vin, |s| workflow::run_closure(s).map(|_| ())),
        Command::Report(report) => match report {
            ReportCommand::LowBills => reports::low_bills(&store),
            ReportCommand::FrequentOwners => reports::frequent_owners(&store),
            ReportCommand::VintageLowMileage => reports::vintage_low_mileage(&store),
            ReportCommand::MostServiced { k } => reports::most_serviced(&store, k),
            ReportCommand::TotalBilling => reports::total_billing(&store),
        },
        Command::Export { format, output } => handle_export(&store, &format, output.as_deref()),
        Command::Stats => handle_stats(&store),
    }
}

/// Picks the database location: the --db flag, or a per-user data directory
fn determine_db_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    let base = dirs::data_dir().context("Could not determine a data directory; pass --db")?;
    Ok(base.join("garage").join("shop.db"))
}

/// Runs one workflow with a fresh session over the store
pub(crate) fn with_session<T>(
    store: &SqliteStore,
    vin: VinPolicy,
    run: impl FnOnce(&mut Session) -> Result<T, garage_core::WorkflowError>,
) -> Result<T> {
    let alloc = MaxIdAllocator::new(store);
    let mut console = StdinConsole::new();
    let mut session = Session::new(store, &alloc, &mut console).with_vin_policy(vin);
    Ok(run(&mut session)?)
}

fn add_customer_cli(
    store: &SqliteStore,
    first_name: &Option<String>,
    last_name: &Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
) -> Result<()> {
    let first_name = required(first_name, "--first-name", validate::name)?;
    let last_name = required(last_name, "--last-name", validate::name)?;
    let phone = required(phone, "--phone", validate::phone)?;
    let address = required(address, "--address", validate::address)?;

    let alloc = MaxIdAllocator::new(store);
    let id = alloc.next(EntityKind::Customer)?;
    store.insert_customer(&Customer {
        id,
        first_name,
        last_name,
        phone,
        address,
    })?;

    println!("{}", format!("Registered customer #{}", id).green());
    Ok(())
}

fn add_mechanic_cli(
    store: &SqliteStore,
    first_name: &Option<String>,
    last_name: &Option<String>,
    experience: &Option<String>,
) -> Result<()> {
    let first_name = required(first_name, "--first-name", validate::name)?;
    let last_name = required(last_name, "--last-name", validate::name)?;
    let experience = required(experience, "--experience", validate::experience)?;

    let alloc = MaxIdAllocator::new(store);
    let id = alloc.next(EntityKind::Mechanic)?;
    store.insert_mechanic(&Mechanic {
        id,
        first_name,
        last_name,
        experience,
    })?;

    println!("{}", format!("Registered mechanic #{}", id).green());
    Ok(())
}

fn add_vehicle_cli(
    store: &SqliteStore,
    policy: VinPolicy,
    vin: &Option<String>,
    make: &Option<String>,
    model: &Option<String>,
    year: &Option<String>,
) -> Result<()> {
    let vin = required(vin, "--vin", |input| policy.validate(input))?;
    let make = required(make, "--make", validate::name)?;
    let model = required(model, "--model", validate::name)?;
    let year = required(year, "--year", validate::year)?;

    if store.vehicle_by_vin(&vin)?.is_some() {
        anyhow::bail!("Vehicle {} is already on file", vin);
    }
    store.insert_vehicle(&Vehicle {
        vin: vin.clone(),
        make,
        model,
        year,
    })?;

    println!("{}", format!("Registered vehicle {}", vin).green());
    Ok(())
}

/// Validates a required flag value, or explains which flag is missing
fn required<T>(
    value: &Option<String>,
    flag: &str,
    validate: impl Fn(&str) -> Result<T, validate::FieldError>,
) -> Result<T> {
    match value {
        Some(raw) => validate(raw).map_err(|e| anyhow::anyhow!("{}: {}", flag, e)),
        None => anyhow::bail!("{} is required (or pass no flags for interactive mode)", flag),
    }
}

fn handle_export(
    store: &SqliteStore,
    format: &str,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let snapshot = Snapshot::capture(store)?;
    let rendered = match format {
        "json" => snapshot.to_json()?,
        "csv" => snapshot.to_csv(),
        other => anyhow::bail!("Unknown export format: {} (expected json or csv)", other),
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", format!("Exported to {}", path.display()).green());
            println!("  Total rows: {}", snapshot.row_count());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn handle_stats(store: &SqliteStore) -> Result<()> {
    let stats = store.stats()?;
    println!("{}", "Shop database".bold());
    println!("  Customers:        {}", stats.customers);
    println!("  Mechanics:        {}", stats.mechanics);
    println!("  Vehicles:         {}", stats.vehicles);
    println!("  Ownerships:       {}", stats.ownerships);
    println!("  Service requests: {}", stats.requests);
    println!("  Closed requests:  {}", stats.closures);
    Ok(())
}
