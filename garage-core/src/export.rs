//! Snapshot export
//!
//! Dumps every table to a serializable snapshot for backup or downstream
//! tooling, rendered as pretty JSON or per-table CSV sections.

use serde::{Deserialize, Serialize};

use crate::db::{ShopStore, StoreError};
use crate::models::{Customer, ClosedRequest, Mechanic, Ownership, ServiceRequest, Vehicle};

/// Everything in the shop database at one point in time
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub mechanics: Vec<Mechanic>,
    pub vehicles: Vec<Vehicle>,
    pub ownerships: Vec<Ownership>,
    pub requests: Vec<ServiceRequest>,
    pub closures: Vec<ClosedRequest>,
}

impl Snapshot {
    /// Reads every table from the store
    pub fn capture(store: &dyn ShopStore) -> Result<Self, StoreError> {
        Ok(Self {
            customers: store.list_customers()?,
            mechanics: store.list_mechanics()?,
            vehicles: store.list_vehicles()?,
            ownerships: store.list_ownerships()?,
            requests: store.list_requests()?,
            closures: store.list_closures()?,
        })
    }

    /// Total rows across all tables
    pub fn row_count(&self) -> usize {
        self.customers.len()
            + self.mechanics.len()
            + self.vehicles.len()
            + self.ownerships.len()
            + self.requests.len()
            + self.closures.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Renders one CSV section per table, separated by blank lines
    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        out.push_str("customers\nid,first_name,last_name,phone,address\n");
        for c in &self.customers {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                c.id,
                escape_csv(&c.first_name),
                escape_csv(&c.last_name),
                escape_csv(&c.phone),
                escape_csv(&c.address),
            ));
        }

        out.push_str("\nmechanics\nid,first_name,last_name,experience\n");
        for m in &self.mechanics {
            out.push_str(&format!(
                "{},{},{},{}\n",
                m.id,
                escape_csv(&m.first_name),
                escape_csv(&m.last_name),
                m.experience,
            ));
        }

        out.push_str("\nvehicles\nvin,make,model,year\n");
        for v in &self.vehicles {
            out.push_str(&format!(
                "{},{},{},{}\n",
                escape_csv(&v.vin),
                escape_csv(&v.make),
                escape_csv(&v.model),
                v.year,
            ));
        }

        out.push_str("\nownerships\nid,customer_id,vin\n");
        for o in &self.ownerships {
            out.push_str(&format!("{},{},{}\n", o.id, o.customer_id, escape_csv(&o.vin)));
        }

        out.push_str("\nservice_requests\nid,customer_id,vin,opened_at,odometer,complaint\n");
        for r in &self.requests {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                r.id,
                r.customer_id,
                escape_csv(&r.vin),
                r.opened_at.to_rfc3339(),
                r.odometer,
                escape_csv(&r.complaint),
            ));
        }

        out.push_str("\nclosed_requests\nid,request_id,mechanic_id,closed_at,comment,bill\n");
        for w in &self.closures {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                w.id,
                w.request_id,
                w.mechanic_id,
                w.closed_at.to_rfc3339(),
                escape_csv(&w.comment),
                w.bill,
            ));
        }

        out
    }
}

/// Quotes a CSV field containing commas, quotes, or newlines (RFC 4180)
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_snapshot_capture_and_render() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_customer(&Customer {
                id: 1,
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                phone: "5551234567".to_string(),
                address: "1 Main St, Apt 2".to_string(),
            })
            .unwrap();

        let snapshot = Snapshot::capture(&store).unwrap();
        assert_eq!(snapshot.row_count(), 1);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"last_name\": \"Doe\""));

        let csv = snapshot.to_csv();
        assert!(csv.contains("1,Jane,Doe,5551234567,\"1 Main St, Apt 2\""));
    }
}
