//! Core library for the garage service desk
//!
//! Domain models, the SQLite-backed store, identifier allocation, and the
//! interactive service request lifecycle workflows shared by the console
//! front end.

pub mod alloc;
pub mod console;
pub mod db;
pub mod export;
pub mod models;
pub mod registration;
pub mod resolve;
pub mod session;
pub mod validate;
pub mod workflow;

// Re-export commonly used types
pub use alloc::{Allocator, EntityKind, MaxIdAllocator};
pub use console::{Console, ConsoleError, ScriptedConsole};
pub use db::{
    ClosedBillingRow, CustomerBillingRow, OwnerCountRow, ServiceCountRow, ShopStats, ShopStore,
    SqliteStore, StoreError, VehicleSummary,
};
pub use export::Snapshot;
pub use models::{Customer, ClosedRequest, Mechanic, Ownership, ServiceRequest, Vehicle};
pub use registration::{register_customer, register_mechanic, register_vehicle};
pub use resolve::{find_customers, resolve_customer, resolve_vehicle, CustomerResolution};
pub use session::Session;
pub use validate::{FieldError, VinPolicy};
pub use workflow::{run_closure, run_intake, WorkflowError};
