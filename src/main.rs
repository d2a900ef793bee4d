//! CLI entry point for the fare brand rater.
//!
//! Loads fare observations from the warehouse or a CSV extract, identifies
//! the Basic Economy brand per airline and market, and writes the deliverable
//! CSV, score tables, run summary and charts, optionally publishing them to S3.

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use fare_brand_rater::analyzers::analyzer::{ExportOptions, run};
use fare_brand_rater::config::WarehouseConfig;
use fare_brand_rater::fetch::{CsvFileSource, FareQuery, FareSource, RedshiftSource};
use fare_brand_rater::output::read_deliverable;
use fare_brand_rater::publish::publish_artifacts;
use fare_brand_rater::summary::AnalysisSummary;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fare_brand_rater")]
#[command(about = "Identify Basic Economy fare brands per airline and market", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the warehouse for a sales-date window and analyze the result
    Run {
        /// First sales date to include (YYYY-MM-DD); defaults to yesterday
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last sales date to include (YYYY-MM-DD); defaults to --from
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only markets whose airports are in this country
        #[arg(long, default_value = "United States")]
        country: String,

        /// Maximum days between observation and departure (0 = no limit)
        #[arg(long, default_value_t = 90)]
        max_days_out: u32,

        /// Maximum number of rows to fetch
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Analyze a local CSV extract that uses the warehouse column names
    Analyze {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Log summary insights for a previously written deliverable CSV
    Summarize {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Directory to write the CSV, JSON and chart files to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Value of the Source column in the deliverable
    #[arg(long, default_value = "Common Output")]
    source_label: String,

    /// Skip chart rendering
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Optional: S3 bucket to publish the artifacts to
    #[arg(long)]
    s3_bucket: Option<String>,

    /// Key prefix for published artifacts
    #[arg(long, default_value = "fare-brands")]
    s3_prefix: String,

    /// Optional: Gzip compress artifacts before uploading to S3
    #[arg(long, default_value_t = false)]
    gzip: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fare_brand_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fare_brand_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            from,
            to,
            country,
            max_days_out,
            limit,
            export,
        } => {
            let from = match from {
                Some(date) => date,
                None => match Utc::now().date_naive().pred_opt() {
                    Some(date) => date,
                    None => bail!("cannot determine yesterday's date"),
                },
            };
            let query = FareQuery {
                country,
                sales_from: from,
                sales_to: to.unwrap_or(from),
                max_days_out: (max_days_out > 0).then_some(max_days_out),
                limit,
            };
            let config = WarehouseConfig::from_env()?;
            let sdk_config = aws_config::load_from_env().await;
            let source = RedshiftSource::new(&sdk_config, config, query);

            analyze_and_publish(&source, export).await?;
        }
        Commands::Analyze { input, export } => {
            let source = CsvFileSource::new(input);
            analyze_and_publish(&source, export).await?;
        }
        Commands::Summarize { input } => {
            let rows = read_deliverable(&input)?;
            if rows.is_empty() {
                warn!(path = %input.display(), "Deliverable has no rows");
            } else {
                AnalysisSummary::from_rows(&rows).log();
            }
        }
    }

    Ok(())
}

/// Runs the pipeline against `source` and uploads the artifacts when a bucket is given.
#[tracing::instrument(skip_all, fields(source = %source.describe()))]
async fn analyze_and_publish(source: &dyn FareSource, export: ExportArgs) -> Result<()> {
    let mut options = ExportOptions::new(&export.output_dir, export.source_label);
    options.charts = !export.no_charts;

    let Some(artifacts) = run(source, &options).await? else {
        return Ok(());
    };

    info!(
        deliverable = %artifacts.deliverable.display(),
        combinations = artifacts.rows.len(),
        charts = artifacts.charts.len(),
        "Analysis complete"
    );

    match export.s3_bucket {
        Some(bucket) if !bucket.is_empty() => {
            info!(bucket = %bucket, gzip = export.gzip, "S3 upload enabled");
            let sdk_config = aws_config::load_from_env().await;
            let s3 = aws_sdk_s3::Client::new(&sdk_config);
            publish_artifacts(
                &s3,
                &bucket,
                &export.s3_prefix,
                options.analysis_date(),
                &artifacts.paths(),
                export.gzip,
            )
            .await?;
        }
        _ => info!("S3 bucket not specified, skipping upload"),
    }

    Ok(())
}
