//! Warehouse connection settings, read from the environment once at startup
//! and passed to the loader explicitly.

use anyhow::{Context, Result, anyhow, bail};
use std::time::Duration;

pub const DEFAULT_FARE_TABLE: &str = "common_output.common_output_format";
pub const DEFAULT_AIRPORT_TABLE: &str = "metadata.airportlocation_extra";

/// Where the statement runs: a provisioned cluster or a serverless workgroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseTarget {
    Cluster {
        identifier: String,
        secret_arn: Option<String>,
        db_user: Option<String>,
    },
    Workgroup {
        name: String,
        secret_arn: Option<String>,
    },
}

/// Redshift Data API settings.
///
/// | Variable                    | Default                               |
/// |-----------------------------|---------------------------------------|
/// | `REDSHIFT_DATABASE`         | required                              |
/// | `REDSHIFT_CLUSTER_ID`       | one of cluster/workgroup              |
/// | `REDSHIFT_WORKGROUP`        | one of cluster/workgroup              |
/// | `REDSHIFT_SECRET_ARN`       | secret name or ARN                    |
/// | `REDSHIFT_DB_USER`          | temporary credentials (cluster only)  |
/// | `FARE_TABLE`                | `common_output.common_output_format`  |
/// | `AIRPORT_TABLE`             | `metadata.airportlocation_extra`      |
/// | `REDSHIFT_POLL_INTERVAL_MS` | 500                                   |
/// | `REDSHIFT_TIMEOUT_SECS`     | 900                                   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub database: String,
    pub target: WarehouseTarget,
    pub fare_table: String,
    pub airport_table: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl WarehouseConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database = get("REDSHIFT_DATABASE").ok_or_else(|| anyhow!("REDSHIFT_DATABASE must be set"))?;
        let secret_arn = get("REDSHIFT_SECRET_ARN");

        let target = match (get("REDSHIFT_CLUSTER_ID"), get("REDSHIFT_WORKGROUP")) {
            (Some(_), Some(_)) => bail!("set only one of REDSHIFT_CLUSTER_ID and REDSHIFT_WORKGROUP"),
            (None, None) => bail!("one of REDSHIFT_CLUSTER_ID or REDSHIFT_WORKGROUP must be set"),
            (Some(identifier), None) => {
                let db_user = get("REDSHIFT_DB_USER");
                if secret_arn.is_none() && db_user.is_none() {
                    bail!("REDSHIFT_CLUSTER_ID requires REDSHIFT_SECRET_ARN or REDSHIFT_DB_USER");
                }
                WarehouseTarget::Cluster {
                    identifier,
                    secret_arn,
                    db_user,
                }
            }
            (None, Some(name)) => WarehouseTarget::Workgroup { name, secret_arn },
        };

        let poll_ms: u64 = match get("REDSHIFT_POLL_INTERVAL_MS") {
            Some(v) => v.parse().context("REDSHIFT_POLL_INTERVAL_MS must be an integer")?,
            None => 500,
        };
        let timeout_secs: u64 = match get("REDSHIFT_TIMEOUT_SECS") {
            Some(v) => v.parse().context("REDSHIFT_TIMEOUT_SECS must be an integer")?,
            None => 900,
        };

        Ok(Self {
            database,
            target,
            fare_table: get("FARE_TABLE").unwrap_or_else(|| DEFAULT_FARE_TABLE.to_string()),
            airport_table: get("AIRPORT_TABLE").unwrap_or_else(|| DEFAULT_AIRPORT_TABLE.to_string()),
            poll_interval: Duration::from_millis(poll_ms.max(1)),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_workgroup_with_defaults() {
        let config = WarehouseConfig::from_lookup(lookup(&[
            ("REDSHIFT_DATABASE", "ds"),
            ("REDSHIFT_WORKGROUP", "analytics"),
        ]))
        .unwrap();

        assert_eq!(config.database, "ds");
        assert_eq!(
            config.target,
            WarehouseTarget::Workgroup {
                name: "analytics".into(),
                secret_arn: None
            }
        );
        assert_eq!(config.fare_table, DEFAULT_FARE_TABLE);
        assert_eq!(config.airport_table, DEFAULT_AIRPORT_TABLE);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(900));
    }

    #[test]
    fn test_cluster_requires_credentials() {
        let err = WarehouseConfig::from_lookup(lookup(&[
            ("REDSHIFT_DATABASE", "ds"),
            ("REDSHIFT_CLUSTER_ID", "monitoring"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REDSHIFT_SECRET_ARN"));

        let config = WarehouseConfig::from_lookup(lookup(&[
            ("REDSHIFT_DATABASE", "ds"),
            ("REDSHIFT_CLUSTER_ID", "monitoring"),
            ("REDSHIFT_SECRET_ARN", "Redshift/analytics/user"),
            ("REDSHIFT_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();
        assert!(matches!(config.target, WarehouseTarget::Cluster { .. }));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_or_conflicting_target() {
        assert!(WarehouseConfig::from_lookup(lookup(&[("REDSHIFT_DATABASE", "ds")])).is_err());
        assert!(WarehouseConfig::from_lookup(lookup(&[("REDSHIFT_WORKGROUP", "wg")])).is_err());
        assert!(
            WarehouseConfig::from_lookup(lookup(&[
                ("REDSHIFT_DATABASE", "ds"),
                ("REDSHIFT_CLUSTER_ID", "c"),
                ("REDSHIFT_WORKGROUP", "wg"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let err = WarehouseConfig::from_lookup(lookup(&[
            ("REDSHIFT_DATABASE", "ds"),
            ("REDSHIFT_WORKGROUP", "wg"),
            ("REDSHIFT_POLL_INTERVAL_MS", "fast"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REDSHIFT_POLL_INTERVAL_MS"));
    }
}
