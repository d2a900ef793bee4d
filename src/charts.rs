//! Descriptive SVG charts for a finished analysis.
//!
//! Each chart is independent: a chart without data is skipped and a chart that
//! fails to render is logged and skipped, so a run never aborts here.

use anyhow::Result;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::grade::Confidence;
use crate::analyzers::types::{MarketResult, ScoredGroup};
use crate::output::DeliverableRow;
use crate::record::{AdvanceBucket, FareRecord};
use crate::stats::DatasetStats;

const CHART_SIZE: (u32, u32) = (1200, 800);
const PRICE_BIN_WIDTH: f64 = 50.0;
const MAX_PRICE_BINS: usize = 60;
const SCORE_BIN_WIDTH: f64 = 5.0;

/// A single bar: label, height and fill colour.
struct Bar {
    label: String,
    value: f64,
    color: RGBColor,
}

fn confidence_color(level: Confidence) -> RGBColor {
    match level {
        Confidence::VeryHigh => RGBColor(46, 139, 87),
        Confidence::High => RGBColor(120, 190, 90),
        Confidence::Medium => RGBColor(255, 165, 0),
        Confidence::Low => RGBColor(230, 100, 60),
        Confidence::VeryLow => RGBColor(220, 20, 60),
    }
}

/// Renders every chart into `dir`, returning the files that were written.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn render_charts(
    dir: &Path,
    stamp: &str,
    records: &[FareRecord],
    stats: &DatasetStats,
    scored: &[ScoredGroup],
    results: &[MarketResult],
    deliverable: &[DeliverableRow],
) -> Vec<PathBuf> {
    let charts: [(&str, &str, Vec<Bar>, (&str, &str)); 5] = [
        (
            "brands_per_market",
            "Average Brands per Market by Airline",
            brands_per_market_bars(results),
            ("Airline", "Average number of brands"),
        ),
        (
            "price_distribution",
            "Fare Price Distribution (inclusive)",
            price_histogram_bars(records),
            ("Price (USD)", "Records"),
        ),
        (
            "advance_purchase",
            "Records by Advance Purchase Window",
            advance_purchase_bars(stats),
            ("Advance purchase window", "Share of records (%)"),
        ),
        (
            "confidence_levels",
            "Basic Economy Detection Confidence",
            confidence_bars(deliverable),
            ("Confidence level", "Airline-market combinations"),
        ),
        (
            "score_distribution",
            "Basic Economy Score Distribution (all brands)",
            score_histogram_bars(scored),
            ("Score", "Brand groups"),
        ),
    ];

    let mut written = Vec::new();
    for (name, title, bars, (x_desc, y_desc)) in charts {
        if bars.is_empty() || bars.iter().all(|b| b.value <= 0.0) {
            warn!(chart = name, "No data for chart, skipping");
            continue;
        }

        let path = dir.join(format!("{name}_{stamp}.svg"));
        match draw_bar_chart(&path, title, x_desc, y_desc, &bars) {
            Ok(()) => {
                info!(chart = name, path = %path.display(), "Chart written");
                written.push(path);
            }
            Err(e) => warn!(chart = name, error = %e, "Chart rendering failed, skipping"),
        }
    }
    written
}

fn draw_bar_chart(path: &Path, title: &str, x_desc: &str, y_desc: &str, bars: &[Bar]) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = bars.iter().map(|b| b.value).fold(0.0, f64::max) * 1.1;
    let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0..bars.len() as i32).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(bars.len())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|l| l.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let i = i as i32;
        let mut rect = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.value)],
            bar.color.filled(),
        );
        rect.set_margin(0, 0, 4, 4);
        rect
    }))?;

    root.present()?;
    Ok(())
}

fn brands_per_market_bars(results: &[MarketResult]) -> Vec<Bar> {
    let mut per_airline: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for result in results {
        let entry = per_airline.entry(result.airline.as_str()).or_default();
        entry.0 += result.brands.len();
        entry.1 += 1;
    }

    let mut bars: Vec<Bar> = per_airline
        .into_iter()
        .map(|(airline, (brands, markets))| Bar {
            label: airline.to_string(),
            value: brands as f64 / markets as f64,
            color: RGBColor(70, 130, 180),
        })
        .collect();
    bars.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    bars
}

/// Price histogram over the observed range. Bins start at the $50 width and
/// widen in $50 steps so there are never more than `MAX_PRICE_BINS`.
fn price_histogram_bars(records: &[FareRecord]) -> Vec<Bar> {
    let prices: Vec<f64> = records
        .iter()
        .map(|r| r.price_inc)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .collect();
    if prices.is_empty() {
        return Vec::new();
    }
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let low = (min / PRICE_BIN_WIDTH).floor() * PRICE_BIN_WIDTH;
    let span = max - low;
    let steps = (span / MAX_PRICE_BINS as f64 / PRICE_BIN_WIDTH).ceil().max(1.0);
    let width = steps * PRICE_BIN_WIDTH;
    let bin_count = ((span / width).floor() as usize + 1).min(MAX_PRICE_BINS);

    let mut bins = vec![0usize; bin_count];
    for p in prices {
        let bin = (((p - low) / width).floor() as usize).min(bin_count - 1);
        bins[bin] += 1;
    }

    bins.into_iter()
        .enumerate()
        .map(|(i, count)| Bar {
            label: format!("{:.0}", low + i as f64 * width),
            value: count as f64,
            color: RGBColor(135, 206, 235),
        })
        .collect()
}

fn advance_purchase_bars(stats: &DatasetStats) -> Vec<Bar> {
    AdvanceBucket::ALL
        .iter()
        .map(|&bucket| Bar {
            label: bucket.label().to_string(),
            value: stats.bucket_pct(bucket),
            color: RGBColor(255, 215, 0),
        })
        .collect()
}

fn confidence_bars(deliverable: &[DeliverableRow]) -> Vec<Bar> {
    Confidence::DESCENDING
        .iter()
        .map(|&level| Bar {
            label: level.label().to_string(),
            value: deliverable.iter().filter(|r| r.confidence_level == level).count() as f64,
            color: confidence_color(level),
        })
        .collect()
}

fn score_histogram_bars(scored: &[ScoredGroup]) -> Vec<Bar> {
    let bin_count = (100.0 / SCORE_BIN_WIDTH) as usize;
    let mut bins = vec![0usize; bin_count];
    for s in scored {
        let bin = ((s.score.total / SCORE_BIN_WIDTH).floor() as usize).min(bin_count - 1);
        bins[bin] += 1;
    }
    if scored.is_empty() {
        return Vec::new();
    }

    bins.into_iter()
        .enumerate()
        .map(|(i, count)| {
            let low = i as f64 * SCORE_BIN_WIDTH;
            Bar {
                label: format!("{low:.0}"),
                value: count as f64,
                color: confidence_color(Confidence::from_score(low)),
            }
        })
        .collect()
}
