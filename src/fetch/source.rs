use crate::record::RawFare;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FareSource: Send + Sync {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    async fn fetch_fares(&self) -> Result<Vec<RawFare>>;
}
