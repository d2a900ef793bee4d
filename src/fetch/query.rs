use anyhow::{Result, bail};
use chrono::NaiveDate;

const COLUMNS: [&str; 11] = [
    "carrier",
    "origin",
    "destination",
    "outbound_fare_family",
    "price_inc",
    "price_exc",
    "refundable",
    "change_fee",
    "sales_date",
    "observation_date",
    "outbound_departure_date",
];

/// The extraction window for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct FareQuery {
    pub country: String,
    /// Inclusive sales-date range.
    pub sales_from: NaiveDate,
    pub sales_to: NaiveDate,
    pub max_days_out: Option<u32>,
    pub limit: Option<usize>,
}

impl FareQuery {
    pub fn for_sales_date(date: NaiveDate) -> Self {
        Self {
            country: "United States".to_string(),
            sales_from: date,
            sales_to: date,
            max_days_out: Some(90),
            limit: None,
        }
    }

    pub fn to_sql(&self, fare_table: &str, airport_table: &str) -> Result<String> {
        if self.sales_from > self.sales_to {
            bail!(
                "sales window is empty: {} is after {}",
                self.sales_from,
                self.sales_to
            );
        }
        let fares = identifier(fare_table)?;
        let airports = identifier(airport_table)?;
        let country = quote_literal(&self.country);
        let in_country =
            format!("(SELECT airportcode FROM {airports} WHERE countryname = {country})");

        let mut sql = format!(
            "SELECT {}\nFROM {fares}\nWHERE sales_date BETWEEN {} AND {}\n\
             AND origin IN {in_country}\n\
             AND destination IN {in_country}\n\
             AND origin != destination\n\
             AND carrier IS NOT NULL\n\
             AND outbound_fare_family IS NOT NULL\n\
             AND price_inc > 0",
            COLUMNS.join(", "),
            self.sales_from.format("%Y%m%d"),
            self.sales_to.format("%Y%m%d"),
        );

        if let Some(days) = self.max_days_out {
            sql.push_str(&format!(
                "\nAND DATEDIFF(day, observation_date, outbound_departure_date) BETWEEN 0 AND {days}"
            ));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {limit}"));
        }
        Ok(sql)
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Accepts `schema.table` style names only.
fn identifier(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !valid {
        bail!("invalid table name '{name}'");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_query() {
        let sql = FareQuery::for_sales_date(date(2025, 6, 29))
            .to_sql("common_output.common_output_format", "metadata.airportlocation_extra")
            .unwrap();

        assert!(sql.starts_with("SELECT carrier, origin, destination, outbound_fare_family"));
        assert!(sql.contains("FROM common_output.common_output_format"));
        assert!(sql.contains("sales_date BETWEEN 20250629 AND 20250629"));
        assert!(sql.contains(
            "origin IN (SELECT airportcode FROM metadata.airportlocation_extra WHERE countryname = 'United States')"
        ));
        assert!(sql.contains("AND price_inc > 0"));
        assert!(sql.contains("BETWEEN 0 AND 90"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_limit_and_unbounded_window() {
        let mut query = FareQuery::for_sales_date(date(2025, 6, 1));
        query.sales_to = date(2025, 6, 30);
        query.max_days_out = None;
        query.limit = Some(75000);

        let sql = query.to_sql("f.t", "a.t").unwrap();
        assert!(sql.contains("BETWEEN 20250601 AND 20250630"));
        assert!(!sql.contains("DATEDIFF"));
        assert!(sql.ends_with("LIMIT 75000"));
    }

    #[test]
    fn test_country_is_quoted() {
        let mut query = FareQuery::for_sales_date(date(2025, 6, 29));
        query.country = "Cote d'Ivoire".into();
        let sql = query.to_sql("f.t", "a.t").unwrap();
        assert!(sql.contains("countryname = 'Cote d''Ivoire'"));
    }

    #[test]
    fn test_rejects_bad_input() {
        let query = FareQuery::for_sales_date(date(2025, 6, 29));
        assert!(query.to_sql("fares; DROP TABLE x", "a.t").is_err());
        assert!(query.to_sql("f.t", "a..t").is_err());

        let mut backwards = query.clone();
        backwards.sales_from = date(2025, 7, 1);
        assert!(backwards.to_sql("f.t", "a.t").is_err());
    }
}
