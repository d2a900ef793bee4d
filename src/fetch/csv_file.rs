use super::source::FareSource;
use crate::record::RawFare;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::path::PathBuf;

/// Reads a CSV extract that uses the warehouse column names.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FareSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn fetch_fares(&self) -> Result<Vec<RawFare>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open fare extract {}", self.path.display()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut fares = Vec::new();
        for (line, result) in rdr.deserialize().enumerate() {
            let fare: RawFare = result
                .with_context(|| format!("{}: bad row {}", self.path.display(), line + 2))?;
            fares.push(fare);
        }
        Ok(fares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[tokio::test]
    async fn test_reads_known_columns() {
        let dir = env::temp_dir().join("fare_brand_rater_test_csv_source");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("extract.csv");
        fs::write(
            &path,
            "carrier,origin,destination,outbound_fare_family,price_inc,refundable,change_fee,cabin\n\
             AA, jfk ,LAX,BASIC ECONOMY,199.5,N,,Y\n\
             AA,JFK,LAX,MAIN CABIN,n/a,Y,75,Y\n",
        )
        .unwrap();

        let fares = CsvFileSource::new(&path).fetch_fares().await.unwrap();
        assert_eq!(fares.len(), 2);
        assert_eq!(fares[0].origin.as_deref(), Some("jfk"));
        assert_eq!(fares[0].price_inc, Some(199.5));
        assert_eq!(fares[0].change_fee, None);
        assert_eq!(fares[0].observation_date, None);
        assert_eq!(fares[1].price_inc, None);
        assert_eq!(fares[1].change_fee, Some(75.0));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = CsvFileSource::new("/nonexistent/fares.csv");
        let err = source.fetch_fares().await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/fares.csv"));
    }
}
