//! Summary insights over a deliverable table: which brand each airline uses
//! as Basic Economy, how confident the detection is, and how often the
//! identified brand names look like Basic Economy products.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::analyzers::grade::Confidence;
use crate::analyzers::score::has_basic_keyword;
use crate::analyzers::utility::pct;
use crate::output::DeliverableRow;

#[derive(Debug, Serialize, PartialEq)]
pub struct AirlineSummary {
    pub airline: String,
    pub markets: usize,
    pub high_confidence_markets: usize,
    /// Most frequent identified brand among High/Very High rows.
    pub primary_brand: Option<String>,
    pub avg_brands_per_market: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AnalysisSummary {
    pub combinations: usize,
    pub airlines: usize,
    pub markets: usize,
    pub confidence_distribution: BTreeMap<Confidence, usize>,
    pub high_confidence_rate: f64,
    pub keyword_match_rate: f64,
    pub top_brands: Vec<(String, usize)>,
    pub by_airline: Vec<AirlineSummary>,
}

impl AnalysisSummary {
    pub fn from_rows(rows: &[DeliverableRow]) -> Self {
        let mut confidence_distribution = BTreeMap::new();
        let mut brand_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut per_airline: BTreeMap<&str, Vec<&DeliverableRow>> = BTreeMap::new();
        let markets: BTreeSet<&str> = rows.iter().map(|r| r.market.as_str()).collect();

        for row in rows {
            *confidence_distribution.entry(row.confidence_level).or_default() += 1;
            if !row.identified_brand.is_empty() {
                *brand_counts.entry(row.identified_brand.as_str()).or_default() += 1;
            }
            per_airline.entry(row.airline.as_str()).or_default().push(row);
        }

        let high = rows.iter().filter(|r| r.confidence_level.is_high()).count();
        let keyword_matches = rows
            .iter()
            .filter(|r| has_basic_keyword(&r.identified_brand))
            .count();

        let by_airline = per_airline
            .into_iter()
            .map(|(airline, airline_rows)| {
                let high_rows: Vec<&str> = airline_rows
                    .iter()
                    .filter(|r| r.confidence_level.is_high())
                    .map(|r| r.identified_brand.as_str())
                    .collect();
                let brands: usize = airline_rows.iter().map(|r| r.brand_count()).sum();

                AirlineSummary {
                    airline: airline.to_string(),
                    markets: airline_rows.len(),
                    high_confidence_markets: high_rows.len(),
                    primary_brand: mode(&high_rows).map(str::to_string),
                    avg_brands_per_market: brands as f64 / airline_rows.len() as f64,
                }
            })
            .collect();

        AnalysisSummary {
            combinations: rows.len(),
            airlines: rows.iter().map(|r| r.airline.as_str()).collect::<BTreeSet<_>>().len(),
            markets: markets.len(),
            confidence_distribution,
            high_confidence_rate: pct(high, rows.len()),
            keyword_match_rate: pct(keyword_matches, rows.len()),
            top_brands: top_counts(brand_counts, 10),
            by_airline,
        }
    }

    /// Logs totals, the confidence mix, then one line per airline.
    pub fn log(&self) {
        info!(
            combinations = self.combinations,
            airlines = self.airlines,
            markets = self.markets,
            high_confidence_pct = %format!("{:.1}", self.high_confidence_rate),
            keyword_match_pct = %format!("{:.1}", self.keyword_match_rate),
            "Analysis summary"
        );

        for level in Confidence::DESCENDING {
            let count = self.confidence_distribution.get(&level).copied().unwrap_or(0);
            info!(
                level = %level,
                count,
                pct = %format!("{:.1}", pct(count, self.combinations)),
                "Confidence level"
            );
        }

        for a in &self.by_airline {
            info!(
                airline = %a.airline,
                markets = a.markets,
                high_confidence = a.high_confidence_markets,
                primary_brand = a.primary_brand.as_deref().unwrap_or("-"),
                avg_brands = %format!("{:.1}", a.avg_brands_per_market),
                "Airline Basic Economy brand"
            );
        }

        for (brand, count) in &self.top_brands {
            info!(brand = %brand, markets = count, "Identified brand");
        }
    }
}

/// Most frequent value; ties resolve to the lexicographically smallest.
fn mode<'a>(values: &[&'a str]) -> Option<&'a str> {
    let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

fn top_counts(counts: BTreeMap<&str, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(airline: &str, market: &str, brand: &str, brands: &str, level: Confidence) -> DeliverableRow {
        DeliverableRow {
            airline: airline.into(),
            source: "test".into(),
            market: market.into(),
            all_detected_brands: brands.into(),
            identified_brand: brand.into(),
            confidence_score: 0.0,
            confidence_level: level,
            price_rank: 1,
            avg_price_inclusive: 100.0,
            pct_refundable: 0.0,
            avg_change_fee: None,
            available_0_7_days: true,
            available_8_14_days: true,
            available_15_21_days: true,
            available_22_plus_days: true,
            analysis_date: NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
            methodology_version: "2.0_Enhanced".into(),
        }
    }

    #[test]
    fn test_mode_ties_resolve_by_name() {
        assert_eq!(mode(&["B", "A", "B", "A"]), Some("A"));
        assert_eq!(mode(&["B", "A", "B"]), Some("B"));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_summary_from_rows() {
        let rows = vec![
            row("AA", "JFK-LAX", "BASIC ECONOMY", "BASIC ECONOMY, MAIN CABIN", Confidence::VeryHigh),
            row("AA", "DFW-ORD", "BASIC ECONOMY", "BASIC ECONOMY, MAIN CABIN, FIRST", Confidence::High),
            row("WN", "DAL-HOU", "WANNA GET AWAY", "WANNA GET AWAY, ANYTIME", Confidence::Medium),
            row("WN", "JFK-LAX", "WANNA GET AWAY", "WANNA GET AWAY", Confidence::Low),
        ];
        let summary = AnalysisSummary::from_rows(&rows);

        assert_eq!(summary.combinations, 4);
        assert_eq!(summary.airlines, 2);
        assert_eq!(summary.markets, 3);
        assert_eq!(summary.high_confidence_rate, 50.0);
        assert_eq!(summary.keyword_match_rate, 50.0);
        assert_eq!(summary.confidence_distribution[&Confidence::Low], 1);
        assert_eq!(summary.top_brands[0], ("BASIC ECONOMY".to_string(), 2));

        let aa = &summary.by_airline[0];
        assert_eq!(aa.airline, "AA");
        assert_eq!(aa.high_confidence_markets, 2);
        assert_eq!(aa.primary_brand.as_deref(), Some("BASIC ECONOMY"));
        assert_eq!(aa.avg_brands_per_market, 2.5);

        let wn = &summary.by_airline[1];
        assert_eq!(wn.primary_brand, None);
        assert_eq!(wn.avg_brands_per_market, 1.5);

        summary.log();
    }
}
