//! Validates raw warehouse rows into [`FareRecord`]s and derives the per-record
//! features (market key, advance-purchase bucket, refundability flag).

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::record::{AdvanceBucket, FareRecord, Market, RawFare, parse_date, parse_refundable};

/// Why a raw row was left out of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingAirline,
    MissingBrand,
    DegenerateMarket,
    InvalidPrice,
    MissingDates,
    PastDeparture,
}

/// Output of [`clean_records`]: the surviving records and a tally of drops.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub records: Vec<FareRecord>,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl CleanReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Validates a single row.
pub fn clean_record(raw: &RawFare) -> Result<FareRecord, DropReason> {
    let airline = non_empty(raw.carrier.as_deref())
        .ok_or(DropReason::MissingAirline)?
        .to_ascii_uppercase();
    let brand = non_empty(raw.outbound_fare_family.as_deref())
        .ok_or(DropReason::MissingBrand)?
        .to_string();

    let origin = raw.origin.as_deref().unwrap_or_default();
    let destination = raw.destination.as_deref().unwrap_or_default();
    let market = Market::new(origin, destination).ok_or(DropReason::DegenerateMarket)?;

    let price_inc = raw
        .price_inc
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or(DropReason::InvalidPrice)?;

    let sales_date = raw.sales_date.as_deref().and_then(parse_date);
    let observation_date = raw
        .observation_date
        .as_deref()
        .and_then(parse_date)
        .or(sales_date)
        .ok_or(DropReason::MissingDates)?;
    let departure_date = raw
        .outbound_departure_date
        .as_deref()
        .and_then(parse_date)
        .ok_or(DropReason::MissingDates)?;

    let days_out = (departure_date - observation_date).num_days();
    if days_out < 0 {
        return Err(DropReason::PastDeparture);
    }

    Ok(FareRecord {
        airline,
        origin: origin.trim().to_ascii_uppercase(),
        destination: destination.trim().to_ascii_uppercase(),
        market,
        brand,
        price_inc,
        price_exc: raw.price_exc.filter(|p| p.is_finite()),
        refundable: parse_refundable(raw.refundable.as_deref()),
        change_fee: raw.change_fee.filter(|f| f.is_finite()),
        sales_date,
        observation_date,
        departure_date,
        days_out,
        bucket: AdvanceBucket::from_days(days_out),
    })
}

/// Cleans a batch of rows, dropping and counting the invalid ones.
#[tracing::instrument(skip_all, fields(input = raw.len()))]
pub fn clean_records(raw: Vec<RawFare>) -> CleanReport {
    let mut report = CleanReport::default();

    for row in &raw {
        match clean_record(row) {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                debug!(?reason, carrier = ?row.carrier, "Dropping fare row");
                *report.dropped.entry(reason).or_default() += 1;
            }
        }
    }

    info!(
        kept = report.records.len(),
        dropped = report.dropped_total(),
        "Fare rows cleaned"
    );
    report
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
