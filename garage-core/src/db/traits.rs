//! Storage abstraction for the shop database
//!
//! `ShopStore` is the persistence collaborator every workflow talks to. The
//! production backend is SQLite; tests use the same backend in memory, and
//! the trait seam keeps failure injection and future backends possible
//! without touching workflow code.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::alloc::EntityKind;
use crate::models::{Customer, ClosedRequest, Mechanic, Ownership, ServiceRequest, Vehicle};

/// Errors from the persistence collaborator
///
/// These are never recovered by reprompting: a store failure aborts the
/// running workflow and surfaces to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {0} is newer than this build supports")]
    SchemaVersion(i32),
}

/// One line of the "closed requests billed under a cap" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedBillingRow {
    pub first_name: String,
    pub last_name: String,
    pub closed_at: DateTime<Utc>,
    pub comment: String,
    pub bill: i64,
}

/// One line of the "customers owning more than N vehicles" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerCountRow {
    pub first_name: String,
    pub last_name: String,
    pub vehicles: i64,
}

/// One line of the "old vehicles serviced at low mileage" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleSummary {
    pub make: String,
    pub model: String,
    pub year: i64,
}

/// One line of the "most serviced vehicles" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCountRow {
    pub make: String,
    pub model: String,
    pub services: i64,
}

/// One line of the "customers by total billing" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerBillingRow {
    pub first_name: String,
    pub last_name: String,
    pub total: i64,
}

/// Row counts per table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopStats {
    pub customers: usize,
    pub mechanics: usize,
    pub vehicles: usize,
    pub ownerships: usize,
    pub requests: usize,
    pub closures: usize,
}

/// The persistence collaborator
pub trait ShopStore {
    // =========================================================================
    // Point lookups
    // =========================================================================

    /// All customers whose stored last name matches `last_name` exactly,
    /// ordered by id
    fn customers_by_last_name(&self, last_name: &str) -> Result<Vec<Customer>, StoreError>;

    fn customer_by_id(&self, id: i64) -> Result<Option<Customer>, StoreError>;

    fn mechanic_by_id(&self, id: i64) -> Result<Option<Mechanic>, StoreError>;

    fn vehicle_by_vin(&self, vin: &str) -> Result<Option<Vehicle>, StoreError>;

    /// Vehicles linked to `customer_id` through the ownership table, ordered
    /// by VIN so enumerated selection lists are stable
    fn vehicles_owned_by(&self, customer_id: i64) -> Result<Vec<Vehicle>, StoreError>;

    fn ownership_exists(&self, customer_id: i64, vin: &str) -> Result<bool, StoreError>;

    fn request_by_id(&self, id: i64) -> Result<Option<ServiceRequest>, StoreError>;

    /// The closing record for a request, if it has one
    fn closure_for_request(&self, request_id: i64) -> Result<Option<ClosedRequest>, StoreError>;

    // =========================================================================
    // Identifier support
    // =========================================================================

    /// Largest identifier issued for `kind`, or None for an empty table
    fn max_id(&self, kind: EntityKind) -> Result<Option<i64>, StoreError>;

    // =========================================================================
    // Inserts
    // =========================================================================

    fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError>;

    fn insert_mechanic(&self, mechanic: &Mechanic) -> Result<(), StoreError>;

    fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError>;

    fn insert_ownership(&self, ownership: &Ownership) -> Result<(), StoreError>;

    fn insert_request(&self, request: &ServiceRequest) -> Result<(), StoreError>;

    fn insert_closure(&self, closure: &ClosedRequest) -> Result<(), StoreError>;

    // =========================================================================
    // Full-table reads (export, stats)
    // =========================================================================

    fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;

    fn list_mechanics(&self) -> Result<Vec<Mechanic>, StoreError>;

    fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;

    fn list_ownerships(&self) -> Result<Vec<Ownership>, StoreError>;

    fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError>;

    fn list_closures(&self) -> Result<Vec<ClosedRequest>, StoreError>;

    // =========================================================================
    // Fixed reports
    // =========================================================================

    /// Closed requests billed under `cap`, with the owning customer's name,
    /// ordered by closing date
    fn closures_billed_under(&self, cap: i64) -> Result<Vec<ClosedBillingRow>, StoreError>;

    /// Customers owning strictly more than `vehicles` vehicles
    fn owners_with_more_than(&self, vehicles: i64) -> Result<Vec<OwnerCountRow>, StoreError>;

    /// Distinct vehicles built before `year` that were serviced with an
    /// odometer reading under `odometer`, ordered by model year
    fn vehicles_serviced_before(
        &self,
        year: i64,
        odometer: i64,
    ) -> Result<Vec<VehicleSummary>, StoreError>;

    /// The `k` vehicles with the most service requests, descending
    fn most_serviced_vehicles(&self, k: i64) -> Result<Vec<ServiceCountRow>, StoreError>;

    /// Customers ranked by the sum of their closed bills, descending
    fn customers_by_total_billing(&self) -> Result<Vec<CustomerBillingRow>, StoreError>;

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Row counts per table; backends may override with a cheaper query
    fn stats(&self) -> Result<ShopStats, StoreError> {
        Ok(ShopStats {
            customers: self.list_customers()?.len(),
            mechanics: self.list_mechanics()?.len(),
            vehicles: self.list_vehicles()?.len(),
            ownerships: self.list_ownerships()?.len(),
            requests: self.list_requests()?.len(),
            closures: self.list_closures()?.len(),
        })
    }
}
