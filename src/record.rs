//! Fare observations: the loosely typed warehouse row and the validated record
//! built from it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single row as returned by the warehouse or read from a CSV extract.
///
/// Every field is optional; validation happens in [`crate::cleaner`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFare {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub outbound_fare_family: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price_inc: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price_exc: Option<f64>,
    #[serde(default)]
    pub refundable: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub change_fee: Option<f64>,
    #[serde(default)]
    pub sales_date: Option<String>,
    #[serde(default)]
    pub observation_date: Option<String>,
    #[serde(default)]
    pub outbound_departure_date: Option<String>,
}

impl RawFare {
    /// Builds a row from column names and their textual values, as produced by
    /// the Redshift Data API. Unknown columns are ignored.
    pub fn from_columns(columns: &[String], values: Vec<Option<String>>) -> Self {
        let mut fare = RawFare::default();

        for (name, value) in columns.iter().zip(values) {
            let value = value.filter(|v| !v.trim().is_empty());
            match name.as_str() {
                "carrier" => fare.carrier = value,
                "origin" => fare.origin = value,
                "destination" => fare.destination = value,
                "outbound_fare_family" => fare.outbound_fare_family = value,
                "price_inc" => fare.price_inc = value.and_then(|v| v.trim().parse().ok()),
                "price_exc" => fare.price_exc = value.and_then(|v| v.trim().parse().ok()),
                "refundable" => fare.refundable = value,
                "change_fee" => fare.change_fee = value.and_then(|v| v.trim().parse().ok()),
                "sales_date" => fare.sales_date = value,
                "observation_date" => fare.observation_date = value,
                "outbound_departure_date" => fare.outbound_departure_date = value,
                _ => {}
            }
        }

        fare
    }
}

/// Unordered origin/destination pair with a canonical `AAA-BBB` key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Market {
    key: String,
}

impl Market {
    /// Normalizes both airport codes and orders them so that `JFK`/`LAX` and
    /// `LAX`/`JFK` share a key. Returns `None` for a degenerate market: a code
    /// that fails normalization, or identical endpoints.
    pub fn new(origin: &str, destination: &str) -> Option<Self> {
        let a = normalize_airport(origin)?;
        let b = normalize_airport(destination)?;
        if a == b {
            return None;
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Some(Self {
            key: format!("{first}-{second}"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

fn normalize_airport(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(code.to_ascii_uppercase())
}

/// Advance-purchase window, in days between observation and departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AdvanceBucket {
    #[serde(rename = "0-7 days")]
    Days0To7,
    #[serde(rename = "8-14 days")]
    Days8To14,
    #[serde(rename = "15-21 days")]
    Days15To21,
    #[serde(rename = "22-30 days")]
    Days22To30,
    #[serde(rename = "30+ days")]
    Days31Plus,
}

impl AdvanceBucket {
    pub const ALL: [AdvanceBucket; 5] = [
        AdvanceBucket::Days0To7,
        AdvanceBucket::Days8To14,
        AdvanceBucket::Days15To21,
        AdvanceBucket::Days22To30,
        AdvanceBucket::Days31Plus,
    ];

    /// Buckets a non-negative day count. Upper bounds are inclusive.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 7 => AdvanceBucket::Days0To7,
            d if d <= 14 => AdvanceBucket::Days8To14,
            d if d <= 21 => AdvanceBucket::Days15To21,
            d if d <= 30 => AdvanceBucket::Days22To30,
            _ => AdvanceBucket::Days31Plus,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            AdvanceBucket::Days0To7 => "0-7 days",
            AdvanceBucket::Days8To14 => "8-14 days",
            AdvanceBucket::Days15To21 => "15-21 days",
            AdvanceBucket::Days22To30 => "22-30 days",
            AdvanceBucket::Days31Plus => "30+ days",
        }
    }
}

/// A validated fare observation. Built once by the cleaner and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FareRecord {
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub market: Market,
    pub brand: String,
    pub price_inc: f64,
    pub price_exc: Option<f64>,
    pub refundable: bool,
    pub change_fee: Option<f64>,
    pub sales_date: Option<NaiveDate>,
    pub observation_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub days_out: i64,
    pub bucket: AdvanceBucket,
}

/// Parses the date layouts the warehouse emits: `2025-06-29`, `20250629`,
/// and timestamps such as `2025-06-29 13:45:00`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .ok()
}

/// Normalizes the assorted refundable encodings (`Y`, `yes`, `true`, `t`, `1`).
pub fn parse_refundable(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => matches!(v.as_str(), "y" | "yes" | "true" | "t" | "1"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_is_unordered() {
        let a = Market::new("jfk", "LAX").unwrap();
        let b = Market::new("LAX", " JFK ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "JFK-LAX");
    }

    #[test]
    fn test_market_degenerate() {
        assert!(Market::new("", "LAX").is_none());
        assert!(Market::new("J-K", "LAX").is_none());
        assert!(Market::new("LAX", "lax").is_none());
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AdvanceBucket::from_days(0), AdvanceBucket::Days0To7);
        assert_eq!(AdvanceBucket::from_days(7), AdvanceBucket::Days0To7);
        assert_eq!(AdvanceBucket::from_days(8), AdvanceBucket::Days8To14);
        assert_eq!(AdvanceBucket::from_days(14), AdvanceBucket::Days8To14);
        assert_eq!(AdvanceBucket::from_days(21), AdvanceBucket::Days15To21);
        assert_eq!(AdvanceBucket::from_days(30), AdvanceBucket::Days22To30);
        assert_eq!(AdvanceBucket::from_days(31), AdvanceBucket::Days31Plus);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 29);
        assert_eq!(parse_date("2025-06-29"), expected);
        assert_eq!(parse_date("20250629"), expected);
        assert_eq!(parse_date("2025-06-29 08:15:00"), expected);
        assert_eq!(parse_date("2025-06-29T08:15:00.123"), expected);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_refundable() {
        assert!(parse_refundable(Some("Y")));
        assert!(parse_refundable(Some("yes")));
        assert!(parse_refundable(Some("TRUE")));
        assert!(parse_refundable(Some("1")));
        assert!(!parse_refundable(Some("N")));
        assert!(!parse_refundable(Some("false")));
        assert!(!parse_refundable(None));
    }

    #[test]
    fn test_from_columns_maps_by_name() {
        let columns: Vec<String> = ["carrier", "price_inc", "ignored", "change_fee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let fare = RawFare::from_columns(
            &columns,
            vec![
                Some("AA".into()),
                Some("123.5".into()),
                Some("x".into()),
                Some("".into()),
            ],
        );
        assert_eq!(fare.carrier.as_deref(), Some("AA"));
        assert_eq!(fare.price_inc, Some(123.5));
        assert_eq!(fare.change_fee, None);
    }
}
