//! Data types used by the aggregation, ranking and scoring pipeline.

use serde::Serialize;

use crate::analyzers::grade::Confidence;
use crate::record::{AdvanceBucket, Market};

/// Whether a brand was observed in each advance-purchase window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability([bool; 5]);

impl Availability {
    pub fn all() -> Self {
        Self([true; 5])
    }

    pub fn mark(&mut self, bucket: AdvanceBucket) {
        self.0[bucket.index()] = true;
    }

    pub fn has(&self, bucket: AdvanceBucket) -> bool {
        self.0[bucket.index()]
    }

    pub fn with(mut self, bucket: AdvanceBucket) -> Self {
        self.mark(bucket);
        self
    }
}

/// Aggregated statistics for one (airline, market, brand) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandGroup {
    pub airline: String,
    pub market: Market,
    pub brand: String,
    pub record_count: usize,
    pub avg_price_inc: f64,
    pub min_price_inc: f64,
    pub max_price_inc: f64,
    pub avg_price_exc: Option<f64>,
    /// Fraction of observations that were refundable, 0.0–1.0.
    pub pct_refundable: f64,
    pub avg_change_fee: Option<f64>,
    pub avg_days_out: f64,
    pub availability: Availability,
}

/// A [`BrandGroup`] with its price rank inside the airline's market offer.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedGroup {
    pub group: BrandGroup,
    pub price_rank: usize,
}

/// Points awarded per factor. `total` is the clamped sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub price_rank: u32,
    pub advance_purchase: u32,
    pub refundability: u32,
    pub change_fee: u32,
    pub brand_keyword: u32,
    pub total: f64,
}

/// A ranked group with its score and confidence label.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGroup {
    pub ranked: RankedGroup,
    pub score: ScoreBreakdown,
    pub confidence: Confidence,
}

impl ScoredGroup {
    pub fn group(&self) -> &BrandGroup {
        &self.ranked.group
    }

    pub fn price_rank(&self) -> usize {
        self.ranked.price_rank
    }
}

/// Outcome for one (airline, market): every brand seen there and the brand
/// identified as Basic Economy.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketResult {
    pub airline: String,
    pub market: Market,
    pub brands: Vec<String>,
    pub identified: ScoredGroup,
}
