use crate::analyzers::aggregate::aggregate_groups;
use crate::analyzers::classify::{score_groups, select_basic_economy};
use crate::analyzers::rank::rank_groups;
use crate::analyzers::score::METHODOLOGY_VERSION;
use crate::analyzers::types::{MarketResult, ScoredGroup};
use crate::charts::render_charts;
use crate::cleaner::{CleanReport, DropReason, clean_records};
use crate::fetch::{FareSource, load_fares};
use crate::output::{BrandScoreRow, DeliverableRow, deliverable_rows, write_csv, write_json};
use crate::record::{AdvanceBucket, RawFare};
use crate::stats::DatasetStats;
use crate::summary::AnalysisSummary;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything computed from one batch of raw rows, before anything is written.
#[derive(Debug)]
pub struct Analysis {
    pub raw_rows: usize,
    pub clean: CleanReport,
    pub stats: DatasetStats,
    pub scored: Vec<ScoredGroup>,
    pub results: Vec<MarketResult>,
}

/// Where and how a run's artifacts are written.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub source_label: String,
    pub charts: bool,
    pub generated_at: DateTime<Utc>,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>, source_label: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            source_label: source_label.into(),
            charts: true,
            generated_at: Utc::now(),
        }
    }

    pub fn analysis_date(&self) -> NaiveDate {
        self.generated_at.date_naive()
    }

    /// File name suffix shared by every artifact of a run.
    pub fn stamp(&self) -> String {
        self.generated_at.format("%Y%m%d_%H%M%S").to_string()
    }
}

/// Files written by a run, plus the deliverable rows they contain.
#[derive(Debug)]
pub struct RunArtifacts {
    pub deliverable: PathBuf,
    pub brand_scores: PathBuf,
    pub run_summary: PathBuf,
    pub charts: Vec<PathBuf>,
    pub rows: Vec<DeliverableRow>,
    pub summary: AnalysisSummary,
}

impl RunArtifacts {
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            self.deliverable.clone(),
            self.brand_scores.clone(),
            self.run_summary.clone(),
        ];
        paths.extend(self.charts.iter().cloned());
        paths
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    methodology_version: &'static str,
    source: &'a str,
    raw_rows: usize,
    clean_records: usize,
    dropped: &'a BTreeMap<DropReason, usize>,
    brand_groups: usize,
    combinations: usize,
    stats: &'a DatasetStats,
    summary: &'a AnalysisSummary,
}

/// Runs the pure part of the pipeline: clean, aggregate, rank, score, classify.
#[tracing::instrument(skip_all, fields(raw_rows = raw.len()))]
pub fn analyze_records(raw: Vec<RawFare>) -> Analysis {
    let raw_rows = raw.len();
    let clean = clean_records(raw);
    let stats = DatasetStats::from_records(&clean.records);
    log_stats(&stats);

    let groups = aggregate_groups(&clean.records);
    let ranked = rank_groups(groups);
    let scored = score_groups(ranked);
    let results = select_basic_economy(&scored);

    info!(
        brand_groups = scored.len(),
        combinations = results.len(),
        "Basic Economy brands identified"
    );

    Analysis {
        raw_rows,
        clean,
        stats,
        scored,
        results,
    }
}

/// Writes the deliverable, brand scores, run summary and charts for `analysis`.
#[tracing::instrument(skip_all, fields(output_dir = %options.output_dir.display()))]
pub fn export(analysis: &Analysis, options: &ExportOptions) -> Result<RunArtifacts> {
    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("creating {}", options.output_dir.display()))?;
    let stamp = options.stamp();

    let rows = deliverable_rows(
        &analysis.results,
        &options.source_label,
        options.analysis_date(),
    );
    let deliverable = options
        .output_dir
        .join(format!("basic_economy_analysis_{stamp}.csv"));
    write_csv(&deliverable, &rows)?;

    let identified: HashSet<(&str, &str, &str)> = analysis
        .results
        .iter()
        .map(|r| {
            let g = r.identified.group();
            (g.airline.as_str(), g.market.as_str(), g.brand.as_str())
        })
        .collect();
    let score_rows: Vec<BrandScoreRow> = analysis
        .scored
        .iter()
        .map(|s| {
            let g = s.group();
            let key = (g.airline.as_str(), g.market.as_str(), g.brand.as_str());
            BrandScoreRow::from_scored(s, identified.contains(&key))
        })
        .collect();
    let brand_scores = options.output_dir.join(format!("brand_scores_{stamp}.csv"));
    write_csv(&brand_scores, &score_rows)?;

    let summary = AnalysisSummary::from_rows(&rows);
    summary.log();

    let run_summary = options.output_dir.join(format!("run_summary_{stamp}.json"));
    write_json(
        &run_summary,
        &RunSummary {
            generated_at: options.generated_at,
            methodology_version: METHODOLOGY_VERSION,
            source: &options.source_label,
            raw_rows: analysis.raw_rows,
            clean_records: analysis.clean.records.len(),
            dropped: &analysis.clean.dropped,
            brand_groups: analysis.scored.len(),
            combinations: rows.len(),
            stats: &analysis.stats,
            summary: &summary,
        },
    )?;

    let charts = if options.charts {
        render_charts(
            &options.output_dir,
            &stamp,
            &analysis.clean.records,
            &analysis.stats,
            &analysis.scored,
            &analysis.results,
            &rows,
        )
    } else {
        Vec::new()
    };

    Ok(RunArtifacts {
        deliverable,
        brand_scores,
        run_summary,
        charts,
        rows,
        summary,
    })
}

/// Loads from `source`, analyzes, and exports.
///
/// Returns `None` without writing anything when there is nothing to analyze.
pub async fn run<S: FareSource + ?Sized>(
    source: &S,
    options: &ExportOptions,
) -> Result<Option<RunArtifacts>> {
    let raw = load_fares(source).await?;
    if raw.is_empty() {
        warn!(source = %source.describe(), "No fare rows returned, nothing to analyze");
        return Ok(None);
    }

    let analysis = analyze_records(raw);
    if analysis.results.is_empty() {
        warn!(
            dropped = analysis.clean.dropped_total(),
            "No usable fare records after cleaning, nothing to export"
        );
        return Ok(None);
    }

    export(&analysis, options).map(Some)
}

fn log_stats(stats: &DatasetStats) {
    info!(
        records = stats.total_records,
        airlines = stats.airlines,
        markets = stats.markets,
        brands = stats.brands,
        price_mean = %format!("{:.2}", stats.price_mean),
        price_median = %format!("{:.2}", stats.price_median),
        price_min = %format!("{:.2}", stats.price_min),
        price_max = %format!("{:.2}", stats.price_max),
        days_out_min = stats.days_out_min,
        days_out_max = stats.days_out_max,
        "Dataset overview"
    );
    for (airline, count) in stats.top_airlines(10) {
        info!(airline, records = count, "Records by airline");
    }
    for bucket in AdvanceBucket::ALL {
        info!(
            bucket = bucket.label(),
            records = stats.records_by_bucket.get(&bucket).copied().unwrap_or(0),
            pct = %format!("{:.1}", stats.bucket_pct(bucket)),
            "Records by advance purchase window"
        );
    }
}
