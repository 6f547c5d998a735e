#![allow(dead_code)]

use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const PAYMENT_HEADER: [&str; 7] = ["reference", "amount", "holder", "card", "expiry", "cvv", "method"];

pub fn write_payments(path: &Path, rows: &[[&str; 7]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(PAYMENT_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `rows` valid payment requests with random amounts under the
/// decline limit. Roughly one in ten uses the declined CVV `000`.
pub fn generate_payments(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(PAYMENT_HEADER)?;

    let mut rng = rand::thread_rng();
    for i in 1..=rows {
        let cents: u32 = rng.gen_range(100..=999_999);
        let amount = format!("{}.{:02}", cents / 100, cents % 100);
        let cvv = if rng.gen_ratio(1, 10) { "000" } else { "123" };
        let reference = i.to_string();
        wtr.write_record([
            reference.as_str(),
            amount.as_str(),
            "Load Test",
            "4111111111111111",
            "12/99",
            cvv,
            "",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_inventory(path: &Path, zones: &[&str]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["location", "zone", "type", "available", "external_ref_id"])?;
    for (i, zone) in zones.iter().enumerate() {
        let location = format!("Level {}", i + 1);
        wtr.write_record([location.as_str(), *zone, "Standard", "true", ""])?;
    }
    wtr.flush()?;
    Ok(())
}
