use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer on file with the shop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    /// Allocator-issued identifier
    pub id: i64,

    /// First name (capped at 32 characters)
    pub first_name: String,

    /// Last name (capped at 32 characters)
    pub last_name: String,

    /// Phone number, 10 to 13 digits
    pub phone: String,

    /// Street address (capped at 256 characters)
    pub address: String,
}

impl Customer {
    /// Returns "First Last" for display
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} ({})",
            self.first_name, self.last_name, self.address, self.phone
        )
    }
}

/// A mechanic employed by the shop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mechanic {
    /// Allocator-issued identifier
    pub id: i64,

    /// First name (capped at 32 characters)
    pub first_name: String,

    /// Last name (capped at 32 characters)
    pub last_name: String,

    /// Years of experience, 0 to 99
    pub experience: i64,
}

impl fmt::Display for Mechanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} years)",
            self.first_name, self.last_name, self.experience
        )
    }
}

/// A vehicle, keyed by its VIN
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicle {
    /// Vehicle identification number, fixed-length uppercase alphanumeric
    pub vin: String,

    /// Manufacturer (capped at 32 characters)
    pub make: String,

    /// Model name (capped at 32 characters)
    pub model: String,

    /// Model year
    pub year: i64,
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} [{}]", self.year, self.make, self.model, self.vin)
    }
}

/// Links a customer to a vehicle they own
///
/// A vehicle may have had several owners and a customer may own several
/// vehicles, so this is its own table rather than a column on either side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ownership {
    /// Allocator-issued identifier
    pub id: i64,

    /// The owning customer
    pub customer_id: i64,

    /// The owned vehicle
    pub vin: String,
}

/// An open service request created by the intake workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Allocator-issued identifier
    pub id: i64,

    /// The customer who brought the vehicle in
    pub customer_id: i64,

    /// The vehicle being serviced
    pub vin: String,

    /// When the request was written, captured at insertion time
    pub opened_at: DateTime<Utc>,

    /// Odometer reading at intake, never negative
    pub odometer: i64,

    /// The customer's complaint
    pub complaint: String,
}

impl ServiceRequest {
    /// Builds a request stamped with the current time
    pub fn new(id: i64, customer_id: i64, vin: String, odometer: i64, complaint: String) -> Self {
        Self {
            id,
            customer_id,
            vin,
            opened_at: Utc::now(),
            odometer,
            complaint,
        }
    }
}

/// The closing record for a service request
///
/// At most one of these exists per service request; the schema enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClosedRequest {
    /// Allocator-issued identifier
    pub id: i64,

    /// The request being closed
    pub request_id: i64,

    /// The mechanic who did the work
    pub mechanic_id: i64,

    /// When the request was closed, captured at insertion time
    pub closed_at: DateTime<Utc>,

    /// Free-text closing comment, may be empty
    pub comment: String,

    /// Billed amount in whole dollars, never negative
    pub bill: i64,
}

impl ClosedRequest {
    /// Builds a closing record stamped with the current time
    pub fn new(id: i64, request_id: i64, mechanic_id: i64, comment: String, bill: i64) -> Self {
        Self {
            id,
            request_id,
            mechanic_id,
            closed_at: Utc::now(),
            comment,
            bill,
        }
    }
}
