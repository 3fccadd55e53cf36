//! SQLite storage backend
//!
//! One connection behind a mutex, WAL journaling, foreign keys on. The
//! schema is applied from `schema.sql` the first time a database file is
//! opened; a version row guards against opening a file written by a newer
//! schema.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::alloc::EntityKind;
use crate::models::{Customer, ClosedRequest, Mechanic, Ownership, ServiceRequest, Vehicle};

use super::traits::{
    ClosedBillingRow, CustomerBillingRow, OwnerCountRow, ServiceCountRow, ShopStore, StoreError,
    VehicleSummary,
};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed shop store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if necessary) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens a private in-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        let current_version: i32 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(include_str!("schema.sql"))?;
        } else if current_version > SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion(current_version));
        }

        Ok(())
    }
}

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn ts_from_sql(col: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
    })
}

fn mechanic_from_row(row: &Row<'_>) -> rusqlite::Result<Mechanic> {
    Ok(Mechanic {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        experience: row.get(3)?,
    })
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        vin: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        year: row.get(3)?,
    })
}

fn ownership_from_row(row: &Row<'_>) -> rusqlite::Result<Ownership> {
    Ok(Ownership {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        vin: row.get(2)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<ServiceRequest> {
    Ok(ServiceRequest {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        vin: row.get(2)?,
        opened_at: ts_from_sql(3, row.get(3)?)?,
        odometer: row.get(4)?,
        complaint: row.get(5)?,
    })
}

fn closure_from_row(row: &Row<'_>) -> rusqlite::Result<ClosedRequest> {
    Ok(ClosedRequest {
        id: row.get(0)?,
        request_id: row.get(1)?,
        mechanic_id: row.get(2)?,
        closed_at: ts_from_sql(3, row.get(3)?)?,
        comment: row.get(4)?,
        bill: row.get(5)?,
    })
}

impl ShopStore for SqliteStore {
    fn customers_by_last_name(&self, last_name: &str) -> Result<Vec<Customer>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, phone, address
             FROM customer WHERE last_name = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([last_name], customer_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn customer_by_id(&self, id: i64) -> Result<Option<Customer>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, first_name, last_name, phone, address
                 FROM customer WHERE id = ?1",
                [id],
                customer_from_row,
            )
            .optional()?)
    }

    fn mechanic_by_id(&self, id: i64) -> Result<Option<Mechanic>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, first_name, last_name, experience
                 FROM mechanic WHERE id = ?1",
                [id],
                mechanic_from_row,
            )
            .optional()?)
    }

    fn vehicle_by_vin(&self, vin: &str) -> Result<Option<Vehicle>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT vin, make, model, year FROM vehicle WHERE vin = ?1",
                [vin],
                vehicle_from_row,
            )
            .optional()?)
    }

    fn vehicles_owned_by(&self, customer_id: i64) -> Result<Vec<Vehicle>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT v.vin, v.make, v.model, v.year
             FROM ownership o JOIN vehicle v ON o.vin = v.vin
             WHERE o.customer_id = ?1
             ORDER BY v.vin",
        )?;
        let rows = stmt.query_map([customer_id], vehicle_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn ownership_exists(&self, customer_id: i64, vin: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ownership WHERE customer_id = ?1 AND vin = ?2",
            params![customer_id, vin],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn request_by_id(&self, id: i64) -> Result<Option<ServiceRequest>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, customer_id, vin, opened_at, odometer, complaint
                 FROM service_request WHERE id = ?1",
                [id],
                request_from_row,
            )
            .optional()?)
    }

    fn closure_for_request(&self, request_id: i64) -> Result<Option<ClosedRequest>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, request_id, mechanic_id, closed_at, comment, bill
                 FROM closed_request WHERE request_id = ?1",
                [request_id],
                closure_from_row,
            )
            .optional()?)
    }

    fn max_id(&self, kind: EntityKind) -> Result<Option<i64>, StoreError> {
        let sql = match kind {
            EntityKind::Customer => "SELECT MAX(id) FROM customer",
            EntityKind::Mechanic => "SELECT MAX(id) FROM mechanic",
            EntityKind::Ownership => "SELECT MAX(id) FROM ownership",
            EntityKind::ServiceRequest => "SELECT MAX(id) FROM service_request",
            EntityKind::ClosedRequest => "SELECT MAX(id) FROM closed_request",
        };
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }

    fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO customer (id, first_name, last_name, phone, address)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                customer.id,
                customer.first_name,
                customer.last_name,
                customer.phone,
                customer.address,
            ],
        )?;
        Ok(())
    }

    fn insert_mechanic(&self, mechanic: &Mechanic) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO mechanic (id, first_name, last_name, experience)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                mechanic.id,
                mechanic.first_name,
                mechanic.last_name,
                mechanic.experience,
            ],
        )?;
        Ok(())
    }

    fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO vehicle (vin, make, model, year) VALUES (?1, ?2, ?3, ?4)",
            params![vehicle.vin, vehicle.make, vehicle.model, vehicle.year],
        )?;
        Ok(())
    }

    fn insert_ownership(&self, ownership: &Ownership) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ownership (id, customer_id, vin) VALUES (?1, ?2, ?3)",
            params![ownership.id, ownership.customer_id, ownership.vin],
        )?;
        Ok(())
    }

    fn insert_request(&self, request: &ServiceRequest) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO service_request (id, customer_id, vin, opened_at, odometer, complaint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                request.id,
                request.customer_id,
                request.vin,
                ts_to_sql(&request.opened_at),
                request.odometer,
                request.complaint,
            ],
        )?;
        Ok(())
    }

    fn insert_closure(&self, closure: &ClosedRequest) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO closed_request (id, request_id, mechanic_id, closed_at, comment, bill)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                closure.id,
                closure.request_id,
                closure.mechanic_id,
                ts_to_sql(&closure.closed_at),
                closure.comment,
                closure.bill,
            ],
        )?;
        Ok(())
    }

    fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, first_name, last_name, phone, address FROM customer ORDER BY id",
        )?;
        let rows = stmt.query_map([], customer_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_mechanics(&self) -> Result<Vec<Mechanic>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, first_name, last_name, experience FROM mechanic ORDER BY id")?;
        let rows = stmt.query_map([], mechanic_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT vin, make, model, year FROM vehicle ORDER BY vin")?;
        let rows = stmt.query_map([], vehicle_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_ownerships(&self) -> Result<Vec<Ownership>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, customer_id, vin FROM ownership ORDER BY id")?;
        let rows = stmt.query_map([], ownership_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, customer_id, vin, opened_at, odometer, complaint
             FROM service_request ORDER BY id",
        )?;
        let rows = stmt.query_map([], request_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_closures(&self) -> Result<Vec<ClosedRequest>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, request_id, mechanic_id, closed_at, comment, bill
             FROM closed_request ORDER BY id",
        )?;
        let rows = stmt.query_map([], closure_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn closures_billed_under(&self, cap: i64) -> Result<Vec<ClosedBillingRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.first_name, c.last_name, w.closed_at, w.comment, w.bill
             FROM closed_request w
             JOIN service_request s ON w.request_id = s.id
             JOIN customer c ON s.customer_id = c.id
             WHERE w.bill < ?1
             ORDER BY w.closed_at",
        )?;
        let rows = stmt.query_map([cap], |row| {
            Ok(ClosedBillingRow {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                closed_at: ts_from_sql(2, row.get(2)?)?,
                comment: row.get(3)?,
                bill: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn owners_with_more_than(&self, vehicles: i64) -> Result<Vec<OwnerCountRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.first_name, c.last_name, COUNT(DISTINCT o.vin) AS vehicles
             FROM customer c JOIN ownership o ON o.customer_id = c.id
             GROUP BY c.id
             HAVING COUNT(DISTINCT o.vin) > ?1
             ORDER BY vehicles DESC",
        )?;
        let rows = stmt.query_map([vehicles], |row| {
            Ok(OwnerCountRow {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                vehicles: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn vehicles_serviced_before(
        &self,
        year: i64,
        odometer: i64,
    ) -> Result<Vec<VehicleSummary>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT v.make, v.model, v.year
             FROM vehicle v JOIN service_request s ON s.vin = v.vin
             WHERE v.year < ?1 AND s.odometer < ?2
             ORDER BY v.year",
        )?;
        let rows = stmt.query_map(params![year, odometer], |row| {
            Ok(VehicleSummary {
                make: row.get(0)?,
                model: row.get(1)?,
                year: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn most_serviced_vehicles(&self, k: i64) -> Result<Vec<ServiceCountRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT v.make, v.model, COUNT(*) AS services
             FROM vehicle v JOIN service_request s ON s.vin = v.vin
             GROUP BY v.vin
             ORDER BY services DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([k], |row| {
            Ok(ServiceCountRow {
                make: row.get(0)?,
                model: row.get(1)?,
                services: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn customers_by_total_billing(&self) -> Result<Vec<CustomerBillingRow>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT c.first_name, c.last_name, SUM(w.bill) AS total
             FROM customer c
             JOIN service_request s ON s.customer_id = c.id
             JOIN closed_request w ON w.request_id = s.id
             GROUP BY c.id
             ORDER BY total DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CustomerBillingRow {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                total: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
