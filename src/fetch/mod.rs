mod csv_file;
mod query;
mod redshift;
mod source;

pub use csv_file::CsvFileSource;
pub use query::FareQuery;
pub use redshift::RedshiftSource;
pub use source::FareSource;

use crate::record::RawFare;
use anyhow::Result;
use tracing::info;

/// Pulls every row from `source` in one bulk read.
#[tracing::instrument(skip_all, fields(source = %source.describe()))]
pub async fn load_fares<S: FareSource + ?Sized>(source: &S) -> Result<Vec<RawFare>> {
    let started = std::time::Instant::now();
    let fares = source.fetch_fares().await?;
    info!(
        rows = fares.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fare rows loaded"
    );
    Ok(fares)
}
