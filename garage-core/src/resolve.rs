//! Customer and vehicle resolution
//!
//! The two disambiguation steps of the intake workflow: turning a partial
//! last-name query into exactly one customer, and turning a customer into
//! exactly one VIN. Selection lists are 0-indexed with a final "register new"
//! entry one past the end; an out-of-range index reprompts rather than being
//! accepted silently.

use crate::alloc::EntityKind;
use crate::db::{ShopStore, StoreError};
use crate::models::{Customer, Ownership};
use crate::registration;
use crate::session::Session;
use crate::validate;
use crate::workflow::WorkflowError;

/// Outcome of a last-name search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerResolution {
    NotFound,
    Single(Customer),
    Multiple(Vec<Customer>),
}

/// Classifies the stored matches for `last_name`
///
/// The search is an exact match against stored values; the caller is
/// expected to clean the query the same way stored names were cleaned.
pub fn find_customers(
    store: &dyn ShopStore,
    last_name: &str,
) -> Result<CustomerResolution, StoreError> {
    let mut matches = store.customers_by_last_name(last_name)?;
    Ok(match matches.len() {
        0 => CustomerResolution::NotFound,
        1 => CustomerResolution::Single(matches.remove(0)),
        _ => CustomerResolution::Multiple(matches),
    })
}

/// Resolves a customer from operator input
///
/// Prompts for a last name, then:
/// - no match: offer registration, re-resolve with the same query afterwards
/// - one match: use it
/// - several matches: enumerated selection, with "register new" at the end
///
/// Returns None when the operator declines to register after a failed
/// search, which cancels the surrounding workflow.
pub fn resolve_customer(session: &mut Session) -> Result<Option<Customer>, WorkflowError> {
    let query = session.prompt_until("Customer last name: ", validate::name)?;

    loop {
        match find_customers(session.store, &query)? {
            CustomerResolution::NotFound => {
                let register = session.prompt_until(
                    "No customer on file with that name. Register one? (y/n): ",
                    validate::yes_no,
                )?;
                if !register {
                    return Ok(None);
                }
                registration::register_customer(session)?;
                // Fall through and search again with the original query
            }
            CustomerResolution::Single(customer) => return Ok(Some(customer)),
            CustomerResolution::Multiple(customers) => {
                session.console.write_line("Select customer:");
                for (i, customer) in customers.iter().enumerate() {
                    session.console.write_line(&format!("{} : {}", i, customer));
                }
                session
                    .console
                    .write_line(&format!("{} : Register new customer", customers.len()));

                let len = customers.len();
                let choice =
                    session.prompt_until("Selection: ", move |input| validate::list_index(input, len))?;
                if choice == len {
                    let customer = registration::register_customer(session)?;
                    return Ok(Some(customer));
                }
                return Ok(Some(customers.into_iter().nth(choice).expect("index checked")));
            }
        }
    }
}

/// Resolves the vehicle for a service request, returning its VIN
///
/// Lists the customer's vehicles for selection; picking the final entry (or
/// having none on file) registers a vehicle and links ownership. The
/// ownership link is written only if this customer does not already own the
/// VIN, so re-registering an existing vehicle never duplicates the link.
pub fn resolve_vehicle(session: &mut Session, customer: &Customer) -> Result<String, WorkflowError> {
    let vehicles = session.store.vehicles_owned_by(customer.id)?;

    if vehicles.is_empty() {
        session
            .console
            .write_line(&format!("{} has no vehicles on file.", customer.full_name()));
    } else {
        session.console.write_line("Select vehicle:");
        for (i, vehicle) in vehicles.iter().enumerate() {
            session.console.write_line(&format!("{} : {}", i, vehicle));
        }
    }
    session
        .console
        .write_line(&format!("{} : Register new vehicle", vehicles.len()));

    let len = vehicles.len();
    let choice = session.prompt_until("Selection: ", move |input| validate::list_index(input, len))?;
    if choice < len {
        return Ok(vehicles.into_iter().nth(choice).expect("index checked").vin);
    }

    let vehicle = registration::register_vehicle(session)?;
    if !session.store.ownership_exists(customer.id, &vehicle.vin)? {
        let id = session.alloc.next(EntityKind::Ownership)?;
        session.store.insert_ownership(&Ownership {
            id,
            customer_id: customer.id,
            vin: vehicle.vin.clone(),
        })?;
        session
            .console
            .write_line(&format!("Linked {} to {}", vehicle.vin, customer.full_name()));
    }
    Ok(vehicle.vin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::MaxIdAllocator;
    use crate::console::ScriptedConsole;
    use crate::db::{ShopStore, SqliteStore};
    use crate::models::Vehicle;

    fn seed_customer(store: &SqliteStore, id: i64, first: &str, last: &str) -> Customer {
        let customer = Customer {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: "5551234567".to_string(),
            address: "1 Main St".to_string(),
        };
        store.insert_customer(&customer).unwrap();
        customer
    }

    fn seed_owned_vehicle(store: &SqliteStore, customer_id: i64, ownership_id: i64, vin: &str) {
        store
            .insert_vehicle(&Vehicle {
                vin: vin.to_string(),
                make: "Honda".to_string(),
                model: "Civic".to_string(),
                year: 2005,
            })
            .unwrap();
        store
            .insert_ownership(&Ownership {
                id: ownership_id,
                customer_id,
                vin: vin.to_string(),
            })
            .unwrap();
    }

    #[test]
    fn test_find_customers_classifies_matches() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(
            find_customers(&store, "Doe").unwrap(),
            CustomerResolution::NotFound
        );

        let jane = seed_customer(&store, 1, "Jane", "Doe");
        assert_eq!(
            find_customers(&store, "Doe").unwrap(),
            CustomerResolution::Single(jane.clone())
        );

        let john = seed_customer(&store, 2, "John", "Doe");
        assert_eq!(
            find_customers(&store, "Doe").unwrap(),
            CustomerResolution::Multiple(vec![jane, john])
        );
    }

    #[test]
    fn test_resolve_customer_single_match() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jane = seed_customer(&store, 1, "Jane", "Doe");
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(["doe"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        // The query gets the same cleaning as stored names, so "doe" matches
        let resolved = resolve_customer(&mut session).unwrap();
        assert_eq!(resolved, Some(jane));
    }

    #[test]
    fn test_resolve_customer_disambiguates_and_reprompts_out_of_range() {
        let store = SqliteStore::open_in_memory().unwrap();
        let _jane = seed_customer(&store, 1, "Jane", "Doe");
        let john = seed_customer(&store, 2, "John", "Doe");
        let alloc = MaxIdAllocator::new(&store);
        // Index 5 is past the create sentinel (2), so it must reprompt
        let mut console = ScriptedConsole::new(["Doe", "5", "1"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let resolved = resolve_customer(&mut session).unwrap();
        assert_eq!(resolved, Some(john));
        assert!(console.saw("enter a number between 0 and 2"));
    }

    #[test]
    fn test_resolve_customer_declined_registration_cancels() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(["Nobody", "n"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        assert_eq!(resolve_customer(&mut session).unwrap(), None);
        assert!(store.list_customers().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_customer_not_found_registers_then_re_resolves() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new([
            "Doe", "y", "Jane", "Doe", "5551234567", "1 Main St",
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let resolved = resolve_customer(&mut session).unwrap().unwrap();
        assert_eq!(resolved.first_name, "Jane");
        assert_eq!(resolved.id, 1);
    }

    #[test]
    fn test_resolve_customer_create_from_multiple_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_customer(&store, 1, "Jane", "Doe");
        seed_customer(&store, 2, "John", "Doe");
        let alloc = MaxIdAllocator::new(&store);
        // Index 2 is the "register new customer" sentinel
        let mut console = ScriptedConsole::new([
            "Doe", "2", "Jim", "Doe", "5559876543", "9 Elm St",
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let resolved = resolve_customer(&mut session).unwrap().unwrap();
        assert_eq!(resolved.id, 3);
        assert_eq!(resolved.first_name, "Jim");
    }

    #[test]
    fn test_resolve_vehicle_picks_from_owned_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jane = seed_customer(&store, 1, "Jane", "Doe");
        seed_owned_vehicle(&store, 1, 1, "1HGCM82633A004352");
        let alloc = MaxIdAllocator::new(&store);
        // Out-of-range first, then the only listed vehicle
        let mut console = ScriptedConsole::new(["9", "0"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let vin = resolve_vehicle(&mut session, &jane).unwrap();
        assert_eq!(vin, "1HGCM82633A004352");
        assert!(console.saw("enter a number between 0 and 1"));
    }

    #[test]
    fn test_resolve_vehicle_registers_and_links_ownership() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jane = seed_customer(&store, 1, "Jane", "Doe");
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new([
            "0", "1HGCM82633A004352", "Honda", "Civic", "2005",
        ]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let vin = resolve_vehicle(&mut session, &jane).unwrap();
        assert_eq!(vin, "1HGCM82633A004352");

        let ownerships = store.list_ownerships().unwrap();
        assert_eq!(ownerships.len(), 1);
        assert_eq!(ownerships[0].customer_id, 1);
        assert_eq!(ownerships[0].vin, vin);

        // The vehicle now shows up in the customer's list
        let owned = store.vehicles_owned_by(1).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].vin, vin);
    }

    #[test]
    fn test_resolve_vehicle_does_not_duplicate_ownership() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jane = seed_customer(&store, 1, "Jane", "Doe");
        seed_owned_vehicle(&store, 1, 1, "1HGCM82633A004352");
        let alloc = MaxIdAllocator::new(&store);
        // Chooses "register new" but enters the VIN already owned
        let mut console = ScriptedConsole::new(["1", "1HGCM82633A004352"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let vin = resolve_vehicle(&mut session, &jane).unwrap();
        assert_eq!(vin, "1HGCM82633A004352");
        assert_eq!(store.list_ownerships().unwrap().len(), 1);
    }
}
