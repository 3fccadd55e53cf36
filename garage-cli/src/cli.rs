use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Service desk for a vehicle repair shop")]
pub struct Cli {
    /// Path to the shop database (defaults to the platform data directory)
    #[clap(long)]
    pub db: Option<PathBuf>,

    /// Number of characters expected in a VIN
    #[clap(long, default_value_t = 17)]
    pub vin_length: usize,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive menu (the default when no command is given)
    Menu,

    /// Register a new customer
    AddCustomer {
        /// First name
        #[clap(long)]
        first_name: Option<String>,

        /// Last name
        #[clap(long)]
        last_name: Option<String>,

        /// Phone number, digits only
        #[clap(long)]
        phone: Option<String>,

        /// Street address
        #[clap(long)]
        address: Option<String>,
    },

    /// Register a new mechanic
    AddMechanic {
        /// First name
        #[clap(long)]
        first_name: Option<String>,

        /// Last name
        #[clap(long)]
        last_name: Option<String>,

        /// Years of experience (0-99)
        #[clap(long)]
        experience: Option<String>,
    },

    /// Register a new vehicle
    AddVehicle {
        /// Vehicle identification number
        #[clap(long)]
        vin: Option<String>,

        /// Manufacturer
        #[clap(long)]
        make: Option<String>,

        /// Model name
        #[clap(long)]
        model: Option<String>,

        /// Model year
        #[clap(long)]
        year: Option<String>,
    },

    /// Open a service request for a customer's vehicle
    Intake,

    /// Close an open service request with a mechanic, comment, and bill
    Close,

    /// Run one of the fixed reports
    #[clap(subcommand)]
    Report(ReportCommand),

    /// Export every table
    Export {
        /// Output format: json or csv
        #[clap(long, default_value = "json")]
        format: String,

        /// Output file (stdout when omitted)
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Show row counts for every table
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Closed requests billed under $100
    LowBills,

    /// Customers owning more than 20 vehicles
    FrequentOwners,

    /// Pre-1995 vehicles serviced with under 50,000 miles
    VintageLowMileage,

    /// The K vehicles with the most service requests
    MostServiced {
        /// How many vehicles to list
        #[clap(long, default_value_t = 10)]
        k: i64,
    },

    /// Customers ranked by total closed billing
    TotalBilling,
}
