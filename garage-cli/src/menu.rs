//! The interactive main menu
//!
//! Loops over the shop operations until the operator exits. Each entry
//! dispatches into the same workflow or report code the direct subcommands
//! use.

use anyhow::Result;
use colored::Colorize;
use inquire::{InquireError, Select};
use std::fmt;

use garage_core::{registration, validate, workflow, SqliteStore, VinPolicy};

use crate::reports;
use crate::with_session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    AddCustomer,
    AddMechanic,
    AddVehicle,
    OpenRequest,
    CloseRequest,
    LowBills,
    FrequentOwners,
    VintageLowMileage,
    MostServiced,
    TotalBilling,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 11] = [
        MenuChoice::AddCustomer,
        MenuChoice::AddMechanic,
        MenuChoice::AddVehicle,
        MenuChoice::OpenRequest,
        MenuChoice::CloseRequest,
        MenuChoice::LowBills,
        MenuChoice::FrequentOwners,
        MenuChoice::VintageLowMileage,
        MenuChoice::MostServiced,
        MenuChoice::TotalBilling,
        MenuChoice::Exit,
    ];
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuChoice::AddCustomer => "Add customer",
            MenuChoice::AddMechanic => "Add mechanic",
            MenuChoice::AddVehicle => "Add vehicle",
            MenuChoice::OpenRequest => "Open service request",
            MenuChoice::CloseRequest => "Close service request",
            MenuChoice::LowBills => "Report: closed requests billed under $100",
            MenuChoice::FrequentOwners => "Report: customers with more than 20 vehicles",
            MenuChoice::VintageLowMileage => "Report: pre-1995 vehicles under 50,000 miles",
            MenuChoice::MostServiced => "Report: most serviced vehicles",
            MenuChoice::TotalBilling => "Report: customers by total billing",
            MenuChoice::Exit => "Exit",
        };
        write!(f, "{}", label)
    }
}

/// The interactive menu loop
pub fn run(store: &SqliteStore, vin: VinPolicy) -> Result<()> {
    loop {
        println!();
        let choice = match Select::new("Main menu", MenuChoice::ALL.to_vec()).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let outcome = match choice {
            MenuChoice::AddCustomer => {
                with_session(store, vin, |s| registration::register_customer(s).map(|_| ()))
            }
            MenuChoice::AddMechanic => {
                with_session(store, vin, |s| registration::register_mechanic(s).map(|_| ()))
            }
            MenuChoice::AddVehicle => {
                with_session(store, vin, |s| registration::register_vehicle(s).map(|_| ()))
            }
            MenuChoice::OpenRequest => {
                with_session(store, vin, |s| workflow::run_intake(s).map(|_| ()))
            }
            MenuChoice::CloseRequest => {
                with_session(store, vin, |s| workflow::run_closure(s).map(|_| ()))
            }
            MenuChoice::LowBills => reports::low_bills(store),
            MenuChoice::FrequentOwners => reports::frequent_owners(store),
            MenuChoice::VintageLowMileage => reports::vintage_low_mileage(store),
            MenuChoice::MostServiced => {
                let k = prompt_report_size(store, vin)?;
                reports::most_serviced(store, k)
            }
            MenuChoice::TotalBilling => reports::total_billing(store),
            MenuChoice::Exit => break,
        };

        // A failed workflow returns to the menu; only rendering errors here
        if let Err(e) = outcome {
            eprintln!("{}", format!("Error: {:#}", e).red());
        }
    }

    println!("Bye!");
    Ok(())
}

fn prompt_report_size(store: &SqliteStore, vin: VinPolicy) -> Result<i64> {
    with_session(store, vin, |s| {
        Ok(s.prompt_until("How many vehicles (K > 0): ", validate::positive)?)
    })
}
