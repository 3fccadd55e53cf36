//! Rendering for the five fixed reports

use anyhow::Result;
use colored::Colorize;

use garage_core::ShopStore;

fn print_footer(total: usize) {
    println!("{}", format!("Total results: {}", total).dimmed());
}

/// Closed requests billed under $100
pub fn low_bills(store: &dyn ShopStore) -> Result<()> {
    println!("{}", "Closed requests billed under $100".bold());
    let rows = store.closures_billed_under(100)?;
    for row in &rows {
        println!(
            "{} {}  {}  ${}  {}",
            row.first_name,
            row.last_name,
            row.closed_at.format("%Y-%m-%d %H:%M"),
            row.bill,
            row.comment,
        );
    }
    print_footer(rows.len());
    Ok(())
}

/// Customers owning more than 20 vehicles
pub fn frequent_owners(store: &dyn ShopStore) -> Result<()> {
    println!("{}", "Customers owning more than 20 vehicles".bold());
    let rows = store.owners_with_more_than(20)?;
    for row in &rows {
        println!(
            "{} {}  {} vehicles",
            row.first_name, row.last_name, row.vehicles
        );
    }
    print_footer(rows.len());
    Ok(())
}

/// Pre-1995 vehicles serviced with under 50,000 miles
pub fn vintage_low_mileage(store: &dyn ShopStore) -> Result<()> {
    println!(
        "{}",
        "Pre-1995 vehicles serviced with under 50,000 miles".bold()
    );
    let rows = store.vehicles_serviced_before(1995, 50_000)?;
    for row in &rows {
        println!("{} {} {}", row.year, row.make, row.model);
    }
    print_footer(rows.len());
    Ok(())
}

/// The `k` vehicles with the most service requests
pub fn most_serviced(store: &dyn ShopStore, k: i64) -> Result<()> {
    anyhow::ensure!(k > 0, "K must be at least 1");
    println!("{}", format!("{} most serviced vehicles", k).bold());
    let rows = store.most_serviced_vehicles(k)?;
    for row in &rows {
        println!("{} {}  {} requests", row.make, row.model, row.services);
    }
    print_footer(rows.len());
    Ok(())
}

/// Customers ranked by total closed billing
pub fn total_billing(store: &dyn ShopStore) -> Result<()> {
    println!("{}", "Customers by total billing".bold());
    let rows = store.customers_by_total_billing()?;
    for row in &rows {
        println!("{} {}  ${}", row.first_name, row.last_name, row.total);
    }
    print_footer(rows.len());
    Ok(())
}
