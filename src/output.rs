//! Output tables and their persistence.
//!
//! The deliverable CSV has one row per (airline, market); the brand score CSV
//! has one row per scored brand group. Both are written whole, never appended.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::grade::Confidence;
use crate::analyzers::score::METHODOLOGY_VERSION;
use crate::analyzers::types::{MarketResult, ScoredGroup};
use crate::analyzers::utility::round_to;
use crate::record::AdvanceBucket;

/// One deliverable row: the Basic Economy brand identified for an airline in a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableRow {
    #[serde(rename = "Airline")]
    pub airline: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Market")]
    pub market: String,
    #[serde(rename = "All_Detected_Brands")]
    pub all_detected_brands: String,
    #[serde(rename = "Identified_Basic_Economy_Brand")]
    pub identified_brand: String,
    #[serde(rename = "Confidence_Score")]
    pub confidence_score: f64,
    #[serde(rename = "Confidence_Level")]
    pub confidence_level: Confidence,
    #[serde(rename = "Price_Rank_in_Market")]
    pub price_rank: usize,
    #[serde(rename = "Avg_Price_Inclusive")]
    pub avg_price_inclusive: f64,
    #[serde(rename = "Pct_Refundable")]
    pub pct_refundable: f64,
    #[serde(rename = "Avg_Change_Fee")]
    pub avg_change_fee: Option<f64>,
    #[serde(rename = "Available_0_7_Days", with = "yes_no")]
    pub available_0_7_days: bool,
    #[serde(rename = "Available_8_14_Days", with = "yes_no")]
    pub available_8_14_days: bool,
    #[serde(rename = "Available_15_21_Days", with = "yes_no")]
    pub available_15_21_days: bool,
    #[serde(rename = "Available_22_Plus_Days", with = "yes_no")]
    pub available_22_plus_days: bool,
    #[serde(rename = "Analysis_Date")]
    pub analysis_date: NaiveDate,
    #[serde(rename = "Methodology_Version")]
    pub methodology_version: String,
}

impl DeliverableRow {
    pub fn from_result(result: &MarketResult, source: &str, analysis_date: NaiveDate) -> Self {
        let scored = &result.identified;
        let group = scored.group();
        let available = |bucket| group.availability.has(bucket);

        DeliverableRow {
            airline: result.airline.clone(),
            source: source.to_string(),
            market: result.market.to_string(),
            all_detected_brands: result.brands.join(", "),
            identified_brand: group.brand.clone(),
            confidence_score: round_to(scored.score.total, 1),
            confidence_level: scored.confidence,
            price_rank: scored.price_rank(),
            avg_price_inclusive: round_to(group.avg_price_inc, 2),
            pct_refundable: round_to(group.pct_refundable * 100.0, 1),
            avg_change_fee: group.avg_change_fee.map(|f| round_to(f, 2)),
            available_0_7_days: available(AdvanceBucket::Days0To7),
            available_8_14_days: available(AdvanceBucket::Days8To14),
            available_15_21_days: available(AdvanceBucket::Days15To21),
            available_22_plus_days: available(AdvanceBucket::Days22To30)
                || available(AdvanceBucket::Days31Plus),
            analysis_date,
            methodology_version: METHODOLOGY_VERSION.to_string(),
        }
    }

    /// Number of brands listed in `All_Detected_Brands`.
    ///
    /// The column is `, `-joined, so a brand name that itself contains `, `
    /// counts more than once. Prefer `MarketResult::brands` when the result
    /// is still at hand; this is for deliverables read back from disk.
    pub fn brand_count(&self) -> usize {
        self.all_detected_brands
            .split(", ")
            .filter(|b| !b.trim().is_empty())
            .count()
    }
}

/// Builds the deliverable table, highest score first, then airline and market.
pub fn deliverable_rows(results: &[MarketResult], source: &str, analysis_date: NaiveDate) -> Vec<DeliverableRow> {
    let mut rows: Vec<DeliverableRow> = results
        .iter()
        .map(|r| DeliverableRow::from_result(r, source, analysis_date))
        .collect();
    rows.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.airline.cmp(&b.airline))
            .then_with(|| a.market.cmp(&b.market))
    });
    rows
}

/// Every scored brand group with its score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct BrandScoreRow {
    pub airline: String,
    pub market: String,
    pub brand: String,
    pub record_count: usize,
    pub avg_price_inc: f64,
    pub min_price_inc: f64,
    pub max_price_inc: f64,
    pub avg_price_exc: Option<f64>,
    pub pct_refundable: f64,
    pub avg_change_fee: Option<f64>,
    pub avg_days_out: f64,
    pub available_0_7: bool,
    pub available_8_14: bool,
    pub available_15_21: bool,
    pub available_22_30: bool,
    pub available_30_plus: bool,
    pub price_rank: usize,
    pub price_rank_points: u32,
    pub advance_purchase_points: u32,
    pub refundability_points: u32,
    pub change_fee_points: u32,
    pub brand_keyword_points: u32,
    pub score: f64,
    pub confidence: Confidence,
    pub identified: bool,
}

impl BrandScoreRow {
    pub fn from_scored(scored: &ScoredGroup, identified: bool) -> Self {
        let g = scored.group();
        let s = &scored.score;
        BrandScoreRow {
            airline: g.airline.clone(),
            market: g.market.to_string(),
            brand: g.brand.clone(),
            record_count: g.record_count,
            avg_price_inc: round_to(g.avg_price_inc, 2),
            min_price_inc: round_to(g.min_price_inc, 2),
            max_price_inc: round_to(g.max_price_inc, 2),
            avg_price_exc: g.avg_price_exc.map(|p| round_to(p, 2)),
            pct_refundable: round_to(g.pct_refundable * 100.0, 1),
            avg_change_fee: g.avg_change_fee.map(|f| round_to(f, 2)),
            avg_days_out: round_to(g.avg_days_out, 1),
            available_0_7: g.availability.has(AdvanceBucket::Days0To7),
            available_8_14: g.availability.has(AdvanceBucket::Days8To14),
            available_15_21: g.availability.has(AdvanceBucket::Days15To21),
            available_22_30: g.availability.has(AdvanceBucket::Days22To30),
            available_30_plus: g.availability.has(AdvanceBucket::Days31Plus),
            price_rank: scored.price_rank(),
            price_rank_points: s.price_rank,
            advance_purchase_points: s.advance_purchase,
            refundability_points: s.refundability,
            change_fee_points: s.change_fee,
            brand_keyword_points: s.brand_keyword,
            score: s.total,
            confidence: scored.confidence,
            identified,
        }
    }
}

/// Writes `rows` to a new CSV file at `path`, replacing any existing file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Writes a value as pretty-printed JSON.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

/// Reads a deliverable CSV written by [`write_csv`].
pub fn read_deliverable(path: &Path) -> Result<Vec<DeliverableRow>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let row: DeliverableRow = result?;
        rows.push(row);
    }

    Ok(rows)
}

/// `Y`/`N` flags in the deliverable.
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Y" } else { "N" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.trim() {
            "Y" | "y" => Ok(true),
            "N" | "n" | "" => Ok(false),
            other => Err(D::Error::custom(format!("expected Y or N, got {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{Availability, BrandGroup, RankedGroup, ScoreBreakdown};
    use crate::record::Market;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn result(airline: &str, score: f64) -> MarketResult {
        let group = BrandGroup {
            airline: airline.into(),
            market: Market::new("ORD", "LGA").unwrap(),
            brand: "BASIC ECONOMY".into(),
            record_count: 3,
            avg_price_inc: 123.456,
            min_price_inc: 100.0,
            max_price_inc: 150.0,
            avg_price_exc: None,
            pct_refundable: 0.0333,
            avg_change_fee: None,
            avg_days_out: 20.0,
            availability: Availability::default()
                .with(AdvanceBucket::Days0To7)
                .with(AdvanceBucket::Days31Plus),
        };
        MarketResult {
            airline: airline.into(),
            market: group.market.clone(),
            brands: vec!["BASIC ECONOMY".into(), "MAIN CABIN".into()],
            identified: ScoredGroup {
                ranked: RankedGroup { group, price_rank: 1 },
                score: ScoreBreakdown {
                    price_rank: 35,
                    advance_purchase: 8,
                    refundability: 25,
                    change_fee: 4,
                    brand_keyword: 10,
                    total: score,
                },
                confidence: Confidence::from_score(score),
            },
        }
    }

    #[test]
    fn test_deliverable_row_formatting() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let row = DeliverableRow::from_result(&result("AA", 82.0), "Common Output", date);

        assert_eq!(row.market, "LGA-ORD");
        assert_eq!(row.all_detected_brands, "BASIC ECONOMY, MAIN CABIN");
        assert_eq!(row.avg_price_inclusive, 123.46);
        assert_eq!(row.pct_refundable, 3.3);
        assert!(row.available_0_7_days);
        assert!(!row.available_8_14_days);
        assert!(row.available_22_plus_days);
        assert_eq!(row.confidence_level, Confidence::VeryHigh);
        assert_eq!(row.methodology_version, METHODOLOGY_VERSION);
        assert_eq!(row.brand_count(), 2);
    }

    #[test]
    fn test_deliverable_sorted_by_score() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let rows = deliverable_rows(&[result("UA", 60.0), result("DL", 90.0), result("AA", 60.0)], "src", date);
        let order: Vec<&str> = rows.iter().map(|r| r.airline.as_str()).collect();
        assert_eq!(order, vec!["DL", "AA", "UA"]);
    }

    #[test]
    fn test_write_and_read_deliverable() {
        let path = temp_path("fare_brand_rater_test_deliverable.csv");
        let _ = fs::remove_file(&path);

        let date = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let rows = deliverable_rows(&[result("B6", 75.0)], "Common Output", date);
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.starts_with("Airline,Source,Market,All_Detected_Brands,Identified_Basic_Economy_Brand"));
        assert!(header.ends_with("Analysis_Date,Methodology_Version"));
        assert!(content.contains(",High,"));
        assert!(content.contains(",Y,N,N,Y,2025-07-03,"));

        let back = read_deliverable(&path).unwrap();
        assert_eq!(back, rows);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_replaces_existing_file() {
        let path = temp_path("fare_brand_rater_test_replace.csv");
        let _ = fs::remove_file(&path);

        let scored = result("WN", 40.0).identified;
        let rows = vec![BrandScoreRow::from_scored(&scored, true)];
        write_csv(&path, &rows).unwrap();
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }
}
