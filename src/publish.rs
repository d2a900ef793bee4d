//! Uploads a run's artifacts to S3 under `<prefix>/<analysis_date>/`.

use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDate;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Uploads every file in `artifacts`, optionally gzip-compressing each one.
/// Returns the object keys written.
#[tracing::instrument(skip(client, artifacts), fields(bucket, prefix, date = %date, gzip, files = artifacts.len()))]
pub async fn publish_artifacts(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    date: NaiveDate,
    artifacts: &[PathBuf],
    gzip: bool,
) -> Result<Vec<String>> {
    let mut keys = Vec::with_capacity(artifacts.len());

    for path in artifacts {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("artifact path has no file name: {}", path.display()))?;
        let contents =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        let key = object_key(prefix, date, file_name, gzip);
        let body = encode_body(contents, gzip)?;

        let mut req = client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type(path));
        if gzip {
            req = req.content_encoding("gzip");
        }
        req.send()
            .await
            .with_context(|| format!("S3 PutObject failed for s3://{bucket}/{key}"))?;

        info!(key = %key, "Artifact uploaded");
        keys.push(key);
    }

    info!(upload_count = keys.len(), "S3 upload complete");
    Ok(keys)
}

fn object_key(prefix: &str, date: NaiveDate, file_name: &str, gzip: bool) -> String {
    let prefix = prefix.trim_matches('/');
    let suffix = if gzip { ".gz" } else { "" };
    if prefix.is_empty() {
        format!("{}/{file_name}{suffix}", date.format("%Y-%m-%d"))
    } else {
        format!("{prefix}/{}/{file_name}{suffix}", date.format("%Y-%m-%d"))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn encode_body(contents: Vec<u8>, gzip: bool) -> Result<Vec<u8>> {
    if !gzip {
        return Ok(contents);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&contents)?;
    Ok(encoder.finish()?)
}
