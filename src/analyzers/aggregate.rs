use crate::analyzers::types::{Availability, BrandGroup};
use crate::analyzers::utility::{mean, mean_opt};
use crate::record::{FareRecord, Market};
use std::collections::BTreeMap;
use tracing::debug;

type GroupKey<'a> = (&'a str, &'a Market, &'a str);

#[derive(Default)]
struct GroupSeries {
    prices: Vec<f64>,
    prices_exc: Vec<f64>,
    change_fees: Vec<f64>,
    days_out: Vec<f64>,
    refundable: usize,
    availability: Availability,
}

/// Aggregates cleaned records into one [`BrandGroup`] per (airline, market, brand).
///
/// Records without a positive, finite inclusive price never reach a group.
/// Groups come back ordered by airline, market, then brand.
pub fn aggregate_groups(records: &[FareRecord]) -> Vec<BrandGroup> {
    let mut series: BTreeMap<GroupKey<'_>, GroupSeries> = BTreeMap::new();

    for record in records {
        if !(record.price_inc.is_finite() && record.price_inc > 0.0) {
            continue;
        }

        let entry = series
            .entry((record.airline.as_str(), &record.market, record.brand.as_str()))
            .or_default();

        entry.prices.push(record.price_inc);
        if let Some(exc) = record.price_exc {
            entry.prices_exc.push(exc);
        }
        if let Some(fee) = record.change_fee {
            entry.change_fees.push(fee);
        }
        entry.days_out.push(record.days_out as f64);
        if record.refundable {
            entry.refundable += 1;
        }
        entry.availability.mark(record.bucket);
    }

    let groups: Vec<BrandGroup> = series
        .into_iter()
        .map(|((airline, market, brand), s)| {
            let count = s.prices.len();
            BrandGroup {
                airline: airline.to_string(),
                market: market.clone(),
                brand: brand.to_string(),
                record_count: count,
                avg_price_inc: mean(&s.prices),
                min_price_inc: s.prices.iter().copied().fold(f64::INFINITY, f64::min),
                max_price_inc: s.prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                avg_price_exc: mean_opt(&s.prices_exc),
                pct_refundable: s.refundable as f64 / count as f64,
                avg_change_fee: mean_opt(&s.change_fees),
                avg_days_out: mean(&s.days_out),
                availability: s.availability,
            }
        })
        .collect();

    debug!(groups = groups.len(), "Brand groups aggregated");
    groups
}
