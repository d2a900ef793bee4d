use super::query::FareQuery;
use super::source::FareSource;
use crate::config::{WarehouseConfig, WarehouseTarget};
use crate::record::RawFare;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use aws_sdk_redshiftdata::types::{Field, StatusString};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Runs the fare query through the Redshift Data API.
///
/// The statement is submitted once, polled until it settles, then its
/// result set is read page by page.
pub struct RedshiftSource {
    client: aws_sdk_redshiftdata::Client,
    config: WarehouseConfig,
    query: FareQuery,
}

impl RedshiftSource {
    /// Creates a source using the ambient AWS configuration already loaded by
    /// `aws_config::load_from_env`.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: WarehouseConfig, query: FareQuery) -> Self {
        Self {
            client: aws_sdk_redshiftdata::Client::new(sdk_config),
            config,
            query,
        }
    }

    async fn submit(&self, sql: String) -> Result<String> {
        let mut req = self
            .client
            .execute_statement()
            .database(&self.config.database)
            .statement_name("fare_brand_rater")
            .sql(sql);

        req = match &self.config.target {
            WarehouseTarget::Cluster {
                identifier,
                secret_arn,
                db_user,
            } => req
                .cluster_identifier(identifier)
                .set_secret_arn(secret_arn.clone())
                .set_db_user(db_user.clone()),
            WarehouseTarget::Workgroup { name, secret_arn } => {
                req.workgroup_name(name).set_secret_arn(secret_arn.clone())
            }
        };

        let resp = req
            .send()
            .await
            .with_context(|| format!("Redshift ExecuteStatement failed on '{}'", self.config.database))?;

        resp.id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Redshift ExecuteStatement returned no statement id"))
    }

    async fn wait_for(&self, id: &str) -> Result<()> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let resp = self
                .client
                .describe_statement()
                .id(id)
                .send()
                .await
                .with_context(|| format!("Redshift DescribeStatement failed for '{id}'"))?;

            match resp.status() {
                Some(StatusString::Finished) => return Ok(()),
                Some(StatusString::Failed) => bail!(
                    "statement {id} failed: {}",
                    resp.error().unwrap_or("no error message")
                ),
                Some(StatusString::Aborted) => bail!("statement {id} was aborted"),
                status => debug!(statement = id, status = ?status, "Statement still running"),
            }

            if Instant::now() >= deadline {
                bail!(
                    "statement {id} did not finish within {}s",
                    self.config.timeout.as_secs()
                );
            }
            sleep(self.config.poll_interval).await;
        }
    }

    async fn read_results(&self, id: &str) -> Result<Vec<RawFare>> {
        let mut fares = Vec::new();
        let mut columns: Vec<String> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let resp = self
                .client
                .get_statement_result()
                .id(id)
                .set_next_token(next_token.take())
                .send()
                .await
                .with_context(|| format!("Redshift GetStatementResult failed for '{id}'"))?;

            if columns.is_empty() {
                columns = resp
                    .column_metadata()
                    .iter()
                    .map(|c| c.name().unwrap_or_default().to_ascii_lowercase())
                    .collect();
            }
            fares.extend(rows_from_records(&columns, resp.records()));
            pages += 1;

            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(statement = id, pages, rows = fares.len(), "Result set read");
        Ok(fares)
    }
}

#[async_trait]
impl FareSource for RedshiftSource {
    fn describe(&self) -> String {
        let target = match &self.config.target {
            WarehouseTarget::Cluster { identifier, .. } => format!("cluster {identifier}"),
            WarehouseTarget::Workgroup { name, .. } => format!("workgroup {name}"),
        };
        format!("redshift:{} ({target})", self.config.fare_table)
    }

    async fn fetch_fares(&self) -> Result<Vec<RawFare>> {
        let sql = self
            .query
            .to_sql(&self.config.fare_table, &self.config.airport_table)?;
        debug!(sql = %sql, "Submitting fare query");

        let id = self.submit(sql).await?;
        info!(statement = %id, "Statement submitted, waiting for completion");
        self.wait_for(&id).await?;
        self.read_results(&id).await
    }
}

fn rows_from_records(columns: &[String], records: &[Vec<Field>]) -> Vec<RawFare> {
    records
        .iter()
        .map(|row| RawFare::from_columns(columns, row.iter().map(field_text).collect()))
        .collect()
}

fn field_text(field: &Field) -> Option<String> {
    match field {
        Field::StringValue(s) => Some(s.clone()),
        Field::LongValue(v) => Some(v.to_string()),
        Field::DoubleValue(v) => Some(v.to_string()),
        Field::BooleanValue(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_refundable;

    #[test]
    fn test_rows_from_records() {
        let columns: Vec<String> = ["carrier", "price_inc", "refundable", "sales_date", "change_fee", "cabin"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let records = vec![
            vec![
                Field::StringValue("DL".into()),
                Field::DoubleValue(129.0),
                Field::BooleanValue(true),
                Field::LongValue(20250629),
                Field::IsNull(true),
                Field::StringValue("M".into()),
            ],
            vec![
                Field::StringValue("DL".into()),
                Field::StringValue("249.99".into()),
                Field::StringValue("N".into()),
                Field::LongValue(20250629),
                Field::LongValue(75),
                Field::IsNull(true),
            ],
        ];

        let fares = rows_from_records(&columns, &records);
        assert_eq!(fares.len(), 2);
        assert_eq!(fares[0].carrier.as_deref(), Some("DL"));
        assert_eq!(fares[0].price_inc, Some(129.0));
        assert!(parse_refundable(fares[0].refundable.as_deref()));
        assert_eq!(fares[0].sales_date.as_deref(), Some("20250629"));
        assert_eq!(fares[0].change_fee, None);
        assert_eq!(fares[1].price_inc, Some(249.99));
        assert!(!parse_refundable(fares[1].refundable.as_deref()));
        assert_eq!(fares[1].change_fee, Some(75.0));
    }
}
