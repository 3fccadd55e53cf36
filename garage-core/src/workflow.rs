//! The service request lifecycle workflows
//!
//! Intake opens a request for a resolved customer and vehicle; closure
//! finalizes an open request with a mechanic, comment, and bill. Both are
//! strictly sequential prompt-driven state machines. Validation failures
//! reprompt; store and console failures abort the workflow and surface to
//! the caller. No compensating rollback is attempted: records written before
//! an abort stay written.

use thiserror::Error;

use crate::alloc::EntityKind;
use crate::console::ConsoleError;
use crate::db::StoreError;
use crate::models::{ClosedRequest, ServiceRequest};
use crate::resolve;
use crate::session::Session;
use crate::validate;

/// Aborts a running workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Console(#[from] ConsoleError),
}

/// Opens a new service request
///
/// Resolves the customer (offering registration on a miss), resolves the
/// vehicle (registering and linking ownership when needed), collects the
/// odometer reading and complaint, then allocates the request identifier and
/// writes the row, stamping the insertion time. Returns the new request id,
/// or None when the operator cancels at customer resolution.
pub fn run_intake(session: &mut Session) -> Result<Option<i64>, WorkflowError> {
    let Some(customer) = resolve::resolve_customer(session)? else {
        session.console.write_line("Intake cancelled.");
        return Ok(None);
    };
    let vin = resolve::resolve_vehicle(session, &customer)?;

    let odometer = session.prompt_until("Odometer reading: ", validate::non_negative)?;
    let complaint = session.prompt_until("Complaint: ", validate::non_empty)?;

    let id = session.alloc.next(EntityKind::ServiceRequest)?;
    let request = ServiceRequest::new(id, customer.id, vin, odometer, complaint);
    session.store.insert_request(&request)?;

    session
        .console
        .write_line(&format!("Opened service request #{}", id));
    Ok(Some(id))
}

/// Closes an open service request
///
/// Validates the mechanic and the request (which must exist and not already
/// be closed), collects the closing comment and bill, then allocates the
/// closure identifier and writes the row, stamping the insertion time.
/// Returns the closure id.
pub fn run_closure(session: &mut Session) -> Result<i64, WorkflowError> {
    let mechanic = loop {
        let mid = session.prompt_until("Mechanic id: ", validate::non_negative)?;
        match session.store.mechanic_by_id(mid)? {
            Some(mechanic) => break mechanic,
            None => session
                .console
                .write_line(&format!("No mechanic with id {}", mid)),
        }
    };

    let request = loop {
        let rid = session.prompt_until("Service request id: ", validate::non_negative)?;
        let Some(request) = session.store.request_by_id(rid)? else {
            session
                .console
                .write_line(&format!("No service request with id {}", rid));
            continue;
        };
        if session.store.closure_for_request(rid)?.is_some() {
            session
                .console
                .write_line(&format!("Service request {} is already closed", rid));
            continue;
        }
        break request;
    };

    // Comments are free text and may be empty
    let comment = session.console.read_line("Closing comment: ")?;
    let bill = session.prompt_until("Bill amount: ", validate::non_negative)?;

    let id = session.alloc.next(EntityKind::ClosedRequest)?;
    let closure = ClosedRequest::new(id, request.id, mechanic.id, comment, bill);
    session.store.insert_closure(&closure)?;

    session.console.write_line(&format!(
        "Closed service request #{} (closure #{})",
        request.id, id
    ));
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::MaxIdAllocator;
    use crate::console::ScriptedConsole;
    use crate::db::{ShopStore, SqliteStore};
    use crate::models::{Customer, Mechanic, Ownership, Vehicle};
    use crate::registration;

    fn seed_mechanic(store: &SqliteStore) -> Mechanic {
        let mechanic = Mechanic {
            id: 1,
            first_name: "Bob".to_string(),
            last_name: "Smith".to_string(),
            experience: 12,
        };
        store.insert_mechanic(&mechanic).unwrap();
        mechanic
    }

    fn seed_customer_with_vehicle(store: &SqliteStore) -> (Customer, Vehicle) {
        let customer = Customer {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: "5551234567".to_string(),
            address: "1 Main St".to_string(),
        };
        store.insert_customer(&customer).unwrap();
        let vehicle = Vehicle {
            vin: "1HGCM82633A004352".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2005,
        };
        store.insert_vehicle(&vehicle).unwrap();
        store
            .insert_ownership(&Ownership {
                id: 1,
                customer_id: customer.id,
                vin: vehicle.vin.clone(),
            })
            .unwrap();
        (customer, vehicle)
    }

    #[test]
    fn test_created_customer_found_by_search() {
        // Scenario A: register, then search the last name
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console =
            ScriptedConsole::new(["Jane", "Doe", "5551234567", "1 Main St"]);
        let mut session = Session::new(&store, &alloc, &mut console);
        registration::register_customer(&mut session).unwrap();

        let found = store.customers_by_last_name("Doe").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Jane");
        assert_eq!(found[0].phone, "5551234567");
        assert_eq!(found[0].address, "1 Main St");
    }

    #[test]
    fn test_intake_with_fresh_customer_and_vehicle() {
        // Scenario B rolled into an intake: no vehicles on file, register one
        let store = SqliteStore::open_in_memory().unwrap();
        let customer = Customer {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: "5551234567".to_string(),
            address: "1 Main St".to_string(),
        };
        store.insert_customer(&customer).unwrap();

        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new([
            "Doe",               // last-name query, single match
            "0",                 // register new vehicle (empty list)
            "1HGCM82633A004352", // VIN
            "Honda",
            "Civic",
            "2005",
            "45000",             // odometer
            "brake noise",       // complaint
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let rid = run_intake(&mut session).unwrap().unwrap();
        assert_eq!(rid, 1);

        let ownerships = store.list_ownerships().unwrap();
        assert_eq!(ownerships.len(), 1);
        assert_eq!(ownerships[0].customer_id, 1);
        assert_eq!(ownerships[0].vin, "1HGCM82633A004352");

        let request = store.request_by_id(rid).unwrap().unwrap();
        assert_eq!(request.customer_id, 1);
        assert_eq!(request.vin, "1HGCM82633A004352");
        assert_eq!(request.odometer, 45000);
        assert_eq!(request.complaint, "brake noise");

        // The registered vehicle is selectable in a subsequent intake
        let mut console = ScriptedConsole::new(["Doe", "0", "46000", "still noisy"]);
        let mut session = Session::new(&store, &alloc, &mut console);
        let second = run_intake(&mut session).unwrap().unwrap();
        assert_eq!(second, 2);
        assert_eq!(
            store.request_by_id(second).unwrap().unwrap().vin,
            "1HGCM82633A004352"
        );
    }

    #[test]
    fn test_intake_rejects_negative_odometer_and_empty_complaint() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (_customer, _vehicle) = seed_customer_with_vehicle(&store);
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new([
            "Doe", "0", "-5", "0", // odometer: negative reprompts, zero accepted
            "", "brake noise",     // complaint: empty reprompts
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let rid = run_intake(&mut session).unwrap().unwrap();
        let request = store.request_by_id(rid).unwrap().unwrap();
        assert_eq!(request.odometer, 0);
        assert_eq!(request.complaint, "brake noise");
        assert!(console.saw("negative values are not allowed"));
    }

    #[test]
    fn test_intake_cancelled_when_registration_declined() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(["Nobody", "n"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        assert_eq!(run_intake(&mut session).unwrap(), None);
        assert!(store.list_requests().unwrap().is_empty());
    }

    #[test]
    fn test_full_lifecycle_and_double_close_rejected() {
        // Scenario C: intake, close, then try to close again
        let store = SqliteStore::open_in_memory().unwrap();
        let mechanic = seed_mechanic(&store);
        let (_customer, _vehicle) = seed_customer_with_vehicle(&store);
        let alloc = MaxIdAllocator::new(&store);

        let mut console =
            ScriptedConsole::new(["Doe", "0", "45000", "brake noise"]);
        let mut session = Session::new(&store, &alloc, &mut console);
        let rid = run_intake(&mut session).unwrap().unwrap();

        let mut console = ScriptedConsole::new(vec![
            mechanic.id.to_string(),
            rid.to_string(),
            "pads replaced".to_string(),
            "80".to_string(),
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);
        let wid = run_closure(&mut session).unwrap();

        let closure = store.closure_for_request(rid).unwrap().unwrap();
        assert_eq!(closure.id, wid);
        assert_eq!(closure.request_id, rid);
        assert_eq!(closure.mechanic_id, mechanic.id);
        assert_eq!(closure.comment, "pads replaced");
        assert_eq!(closure.bill, 80);

        // A second closure of the same request is rejected; the operator has
        // to abandon the workflow since nothing else is open
        let mut console =
            ScriptedConsole::new(vec![mechanic.id.to_string(), rid.to_string()]);
        let mut session = Session::new(&store, &alloc, &mut console);
        let result = run_closure(&mut session);
        assert!(matches!(
            result,
            Err(WorkflowError::Console(ConsoleError::Eof))
        ));
        assert!(console.saw(&format!("Service request {} is already closed", rid)));
        assert_eq!(store.list_closures().unwrap().len(), 1);
    }

    #[test]
    fn test_closure_rejects_unknown_ids_then_accepts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mechanic = seed_mechanic(&store);
        let (customer, vehicle) = seed_customer_with_vehicle(&store);
        store
            .insert_request(&ServiceRequest::new(
                7,
                customer.id,
                vehicle.vin.clone(),
                45000,
                "brake noise".to_string(),
            ))
            .unwrap();

        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(vec![
            "99".to_string(), // no such mechanic
            mechanic.id.to_string(),
            "123".to_string(), // no such request
            "7".to_string(),
            "pads replaced".to_string(),
            "80".to_string(),
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let wid = run_closure(&mut session).unwrap();
        assert_eq!(wid, 1);
        assert!(console.saw("No mechanic with id 99"));
        assert!(console.saw("No service request with id 123"));
        assert!(store.closure_for_request(7).unwrap().is_some());
    }

    #[test]
    fn test_closure_rejects_negative_bill_accepts_zero() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mechanic = seed_mechanic(&store);
        let (customer, vehicle) = seed_customer_with_vehicle(&store);
        store
            .insert_request(&ServiceRequest::new(
                1,
                customer.id,
                vehicle.vin.clone(),
                45000,
                "brake noise".to_string(),
            ))
            .unwrap();

        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(vec![
            mechanic.id.to_string(),
            "1".to_string(),
            "goodwill repair".to_string(),
            "-80".to_string(),
            "0".to_string(),
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        run_closure(&mut session).unwrap();
        assert_eq!(store.closure_for_request(1).unwrap().unwrap().bill, 0);
        assert!(console.saw("negative values are not allowed"));
    }

    #[test]
    fn test_aborted_intake_keeps_earlier_registrations() {
        // The input stream ends mid-workflow after a customer was registered;
        // the workflow aborts but the registration stays persisted
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new([
            "Doe", "y", "Jane", "Doe", "5551234567", "1 Main St",
            // stream ends before a vehicle is chosen
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let result = run_intake(&mut session);
        assert!(matches!(
            result,
            Err(WorkflowError::Console(ConsoleError::Eof))
        ));
        assert_eq!(store.list_customers().unwrap().len(), 1);
        assert!(store.list_requests().unwrap().is_empty());
    }
}
