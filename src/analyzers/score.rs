use crate::analyzers::types::{RankedGroup, ScoreBreakdown};
use crate::record::AdvanceBucket;

/// Scoring scheme identifier written to every output row.
pub const METHODOLOGY_VERSION: &str = "2.0_Enhanced";

/// Points for availability in each advance-purchase window; 30+ days earns none.
static ADVANCE_PURCHASE_POINTS: &[(AdvanceBucket, u32)] = &[
    (AdvanceBucket::Days0To7, 8),
    (AdvanceBucket::Days8To14, 6),
    (AdvanceBucket::Days15To21, 4),
    (AdvanceBucket::Days22To30, 2),
];
const ADVANCE_PURCHASE_CAP: u32 = 20;

/// Refundable fraction upper bounds (exclusive) and their points.
static REFUNDABILITY_TIERS: &[(f64, u32)] = &[(0.05, 25), (0.15, 20), (0.30, 15), (0.50, 10)];
const REFUNDABILITY_FLOOR: u32 = 5;

/// Average change fee lower bounds (exclusive) and their points.
static CHANGE_FEE_TIERS: &[(f64, u32)] = &[(150.0, 10), (100.0, 8), (50.0, 6)];
const CHANGE_FEE_FLOOR: u32 = 4;

/// Checked before [`BASIC_KEYWORDS`]; a brand matching both ("Premium
/// Economy") is treated as premium.
pub static PREMIUM_KEYWORDS: &[&str] = &["first", "business", "premium", "plus", "comfort", "extra", "flex"];
pub static BASIC_KEYWORDS: &[&str] = &["basic", "economy", "main", "standard", "saver", "light", "essential"];

const KEYWORD_PREMIUM_POINTS: u32 = 0;
const KEYWORD_BASIC_POINTS: u32 = 10;
const KEYWORD_NEUTRAL_POINTS: u32 = 5;

/// Scores how likely a ranked brand group is the airline's Basic Economy fare.
///
/// Weights: price rank 35, advance purchase 20, refundability 25, change fee
/// 10, brand name 10. The total is clamped to 0–100.
pub fn score_group(ranked: &RankedGroup) -> ScoreBreakdown {
    let group = &ranked.group;

    let price_rank = price_rank_points(ranked.price_rank);
    let advance_purchase = ADVANCE_PURCHASE_POINTS
        .iter()
        .filter(|(bucket, _)| group.availability.has(*bucket))
        .map(|(_, points)| points)
        .sum::<u32>()
        .min(ADVANCE_PURCHASE_CAP);
    let refundability = refundability_points(group.pct_refundable);
    let change_fee = change_fee_points(group.avg_change_fee);
    let brand_keyword = brand_keyword_points(&group.brand);

    let sum = price_rank + advance_purchase + refundability + change_fee + brand_keyword;

    ScoreBreakdown {
        price_rank,
        advance_purchase,
        refundability,
        change_fee,
        brand_keyword,
        total: (sum as f64).clamp(0.0, 100.0),
    }
}

pub fn price_rank_points(rank: usize) -> u32 {
    match rank {
        1 => 35,
        2 => 25,
        3 => 15,
        4 | 5 => 10,
        _ => 5,
    }
}

pub fn refundability_points(fraction: f64) -> u32 {
    REFUNDABILITY_TIERS
        .iter()
        .find(|(bound, _)| fraction < *bound)
        .map(|(_, points)| *points)
        .unwrap_or(REFUNDABILITY_FLOOR)
}

/// Groups with no change-fee observations get the floor.
pub fn change_fee_points(avg_fee: Option<f64>) -> u32 {
    let Some(fee) = avg_fee else {
        return CHANGE_FEE_FLOOR;
    };
    CHANGE_FEE_TIERS
        .iter()
        .find(|(bound, _)| fee > *bound)
        .map(|(_, points)| *points)
        .unwrap_or(CHANGE_FEE_FLOOR)
}

pub fn brand_keyword_points(brand: &str) -> u32 {
    let brand = brand.to_lowercase();
    if PREMIUM_KEYWORDS.iter().any(|k| brand.contains(k)) {
        KEYWORD_PREMIUM_POINTS
    } else if BASIC_KEYWORDS.iter().any(|k| brand.contains(k)) {
        KEYWORD_BASIC_POINTS
    } else {
        KEYWORD_NEUTRAL_POINTS
    }
}

/// True when the brand name contains one of the basic keywords.
pub fn has_basic_keyword(brand: &str) -> bool {
    let brand = brand.to_lowercase();
    BASIC_KEYWORDS.iter().any(|k| brand.contains(k))
}
