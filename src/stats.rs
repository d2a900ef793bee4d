use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::utility::{mean, median, pct};
use crate::record::{AdvanceBucket, FareRecord};

/// Exploratory overview of the cleaned fare records.
#[derive(Debug, Default, Serialize)]
pub struct DatasetStats {
    pub total_records: usize,
    pub airlines: usize,
    pub markets: usize,
    pub brands: usize,

    // price distribution (inclusive)
    pub price_mean: f64,
    pub price_median: f64,
    pub price_min: f64,
    pub price_max: f64,

    pub records_by_airline: BTreeMap<String, usize>,
    pub records_by_bucket: BTreeMap<AdvanceBucket, usize>,
    pub days_out_min: i64,
    pub days_out_max: i64,
}

impl DatasetStats {
    pub fn from_records(records: &[FareRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut s = DatasetStats {
            total_records: records.len(),
            days_out_min: i64::MAX,
            days_out_max: i64::MIN,
            ..Default::default()
        };

        let mut markets = BTreeSet::new();
        let mut brands = BTreeSet::new();
        let mut prices = Vec::with_capacity(records.len());

        for r in records {
            *s.records_by_airline.entry(r.airline.clone()).or_default() += 1;
            *s.records_by_bucket.entry(r.bucket).or_default() += 1;
            markets.insert(r.market.as_str());
            brands.insert(r.brand.as_str());
            prices.push(r.price_inc);
            s.days_out_min = s.days_out_min.min(r.days_out);
            s.days_out_max = s.days_out_max.max(r.days_out);
        }

        s.airlines = s.records_by_airline.len();
        s.markets = markets.len();
        s.brands = brands.len();
        s.price_mean = mean(&prices);
        s.price_median = median(&prices);
        s.price_min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        s.price_max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        s
    }

    /// Share of records in `bucket`, as a percentage.
    pub fn bucket_pct(&self, bucket: AdvanceBucket) -> f64 {
        pct(
            self.records_by_bucket.get(&bucket).copied().unwrap_or(0),
            self.total_records,
        )
    }

    /// Airlines ordered by record count, largest first.
    pub fn top_airlines(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut airlines: Vec<(&str, usize)> = self
            .records_by_airline
            .iter()
            .map(|(a, c)| (a.as_str(), *c))
            .collect();
        airlines.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        airlines.truncate(limit);
        airlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Market;
    use chrono::NaiveDate;

    fn record(airline: &str, brand: &str, price: f64, days: i64) -> FareRecord {
        let observed = NaiveDate::from_ymd_opt(2025, 6, 25).unwrap();
        FareRecord {
            airline: airline.into(),
            origin: "SEA".into(),
            destination: "SFO".into(),
            market: Market::new("SEA", "SFO").unwrap(),
            brand: brand.into(),
            price_inc: price,
            price_exc: None,
            refundable: false,
            change_fee: None,
            sales_date: None,
            observation_date: observed,
            departure_date: observed + chrono::Duration::days(days),
            days_out: days,
            bucket: AdvanceBucket::from_days(days),
        }
    }

    #[test]
    fn test_from_records_empty() {
        let stats = DatasetStats::from_records(&[]);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.bucket_pct(AdvanceBucket::Days0To7), 0.0);
    }

    #[test]
    fn test_from_records_counts() {
        let records = vec![
            record("AS", "SAVER", 100.0, 3),
            record("AS", "MAIN", 200.0, 10),
            record("AS", "SAVER", 300.0, 40),
            record("UA", "ECO-BASIC", 150.0, 5),
        ];
        let stats = DatasetStats::from_records(&records);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.airlines, 2);
        assert_eq!(stats.markets, 1);
        assert_eq!(stats.brands, 3);
        assert_eq!(stats.price_mean, 187.5);
        assert_eq!(stats.price_median, 175.0);
        assert_eq!(stats.price_min, 100.0);
        assert_eq!(stats.price_max, 300.0);
        assert_eq!(stats.days_out_min, 3);
        assert_eq!(stats.days_out_max, 40);
        assert_eq!(stats.bucket_pct(AdvanceBucket::Days0To7), 50.0);
        assert_eq!(stats.top_airlines(1), vec![("AS", 3)]);
    }
}
