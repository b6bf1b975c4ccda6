//! Fetches the Taxi-Availability service and exports every record to a
//! timestamped CSV under `data/tmp/`.

use std::path::Path;

use anyhow::Result;
use chrono::Local;

use datamall::Client;
use datamall::export;

fn main() -> Result<()> {
    let client = Client::from_env()?;

    // One stamp for both the file name and the Timestamp column.
    let stamp = export::timestamp();
    eprintln!(
        "Calling the Taxi Availability API at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let taxis = client.fetch_all("Taxi-Availability", &[])?;
    eprintln!("Total number of available taxis: {}", taxis.len());

    let path = export::write_csv("TaxiAvailability", &taxis, &stamp, Path::new("data/tmp"))?;
    eprintln!("Wrote {}", path.display());

    Ok(())
}
