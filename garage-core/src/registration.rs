//! Interactive registration of customers, mechanics, and vehicles
//!
//! Each operation collects its fields through validate/reprompt loops,
//! allocates an identifier immediately before the insert, writes the row,
//! and confirms to the operator.

use crate::alloc::EntityKind;
use crate::models::{Customer, Mechanic, Vehicle};
use crate::session::Session;
use crate::validate;
use crate::workflow::WorkflowError;

/// Collects and stores a new customer, returning the created record
pub fn register_customer(session: &mut Session) -> Result<Customer, WorkflowError> {
    let first_name = session.prompt_until("First name: ", validate::name)?;
    let last_name = session.prompt_until("Last name: ", validate::name)?;
    let phone = session.prompt_until("Phone number (digits only): ", validate::phone)?;
    let address = session.prompt_until("Address: ", validate::address)?;

    let id = session.alloc.next(EntityKind::Customer)?;
    let customer = Customer {
        id,
        first_name,
        last_name,
        phone,
        address,
    };
    session.store.insert_customer(&customer)?;
    session
        .console
        .write_line(&format!("Registered customer #{}", id));
    Ok(customer)
}

/// Collects and stores a new mechanic, returning the created record
pub fn register_mechanic(session: &mut Session) -> Result<Mechanic, WorkflowError> {
    let first_name = session.prompt_until("First name: ", validate::name)?;
    let last_name = session.prompt_until("Last name: ", validate::name)?;
    let experience = session.prompt_until("Years of experience: ", validate::experience)?;

    let id = session.alloc.next(EntityKind::Mechanic)?;
    let mechanic = Mechanic {
        id,
        first_name,
        last_name,
        experience,
    };
    session.store.insert_mechanic(&mechanic)?;
    session
        .console
        .write_line(&format!("Registered mechanic #{}", id));
    Ok(mechanic)
}

/// Collects and stores a new vehicle, returning the created record
///
/// A vehicle exists once per physical VIN: if the entered VIN is already on
/// file the stored row is returned as-is and nothing is prompted or written.
pub fn register_vehicle(session: &mut Session) -> Result<Vehicle, WorkflowError> {
    let policy = session.vin;
    let vin = session.prompt_until("VIN: ", move |input| policy.validate(input))?;

    if let Some(existing) = session.store.vehicle_by_vin(&vin)? {
        session
            .console
            .write_line(&format!("Vehicle already on file: {}", existing));
        return Ok(existing);
    }

    let make = session.prompt_until("Make: ", validate::name)?;
    let model = session.prompt_until("Model: ", validate::name)?;
    let year = session.prompt_until("Model year: ", validate::year)?;

    let vehicle = Vehicle {
        vin,
        make,
        model,
        year,
    };
    session.store.insert_vehicle(&vehicle)?;
    session
        .console
        .write_line(&format!("Registered vehicle {}", vehicle.vin));
    Ok(vehicle)
}
