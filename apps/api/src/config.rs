use std::str::FromStr;

use anyhow::{Context, Result};

use crate::analysis::kmeans::ClusterPolicy;
use crate::analysis::pipeline::AnalysisParams;
use crate::analysis::skill_value::MIN_DEMAND;
use crate::analysis::vectorizer::DfBounds;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    pub min_df: f64,
    pub max_df: f64,
    pub cluster_k: usize,
    pub cluster_seed: u64,
    pub cluster_restarts: usize,
    pub cluster_max_iter: u64,
    pub min_demand: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = AnalysisParams::default();
        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: optional_env("DB_MAX_CONNECTIONS", 10)?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            min_df: optional_env("SKILL_MIN_DF", defaults.df_bounds.min_df)?,
            max_df: optional_env("SKILL_MAX_DF", defaults.df_bounds.max_df)?,
            cluster_k: optional_env("CLUSTER_K", defaults.k)?,
            cluster_seed: optional_env("CLUSTER_SEED", defaults.policy.seed)?,
            cluster_restarts: optional_env("CLUSTER_RESTARTS", defaults.policy.restarts)?,
            cluster_max_iter: optional_env("CLUSTER_MAX_ITER", defaults.policy.max_iterations)?,
            min_demand: optional_env("SKILL_MIN_DEMAND", MIN_DEMAND)?,
        };

        config
            .analysis_defaults()
            .validate()
            .context("Analysis defaults from the environment are invalid")?;
        Ok(config)
    }

    /// Pipeline parameters used when a request does not override them.
    pub fn analysis_defaults(&self) -> AnalysisParams {
        AnalysisParams {
            df_bounds: DfBounds {
                min_df: self.min_df,
                max_df: self.max_df,
            },
            k: self.cluster_k,
            policy: ClusterPolicy {
                seed: self.cluster_seed,
                restarts: self.cluster_restarts,
                max_iterations: self.cluster_max_iter,
                ..ClusterPolicy::default()
            },
            min_demand: self.min_demand,
            top_n: None,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let defaults = AnalysisParams::default();
    Config {
        database_url: "postgres://localhost/skillmap_test".to_string(),
        db_max_connections: 1,
        s3_bucket: "skillmap-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
        min_df: defaults.df_bounds.min_df,
        max_df: defaults.df_bounds.max_df,
        cluster_k: defaults.k,
        cluster_seed: defaults.policy.seed,
        cluster_restarts: defaults.policy.restarts,
        cluster_max_iter: defaults.policy.max_iterations,
        min_demand: defaults.min_demand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_default_and_parse() {
        assert_eq!(
            optional_env("SKILLMAP_TEST_UNSET_VAR", 7usize).unwrap(),
            7
        );
        std::env::set_var("SKILLMAP_TEST_K", " 5 ");
        assert_eq!(optional_env("SKILLMAP_TEST_K", 1usize).unwrap(), 5);
        std::env::set_var("SKILLMAP_TEST_BAD_DF", "lots");
        let err = optional_env("SKILLMAP_TEST_BAD_DF", 0.5f64).unwrap_err();
        assert!(err.to_string().contains("SKILLMAP_TEST_BAD_DF"));
    }

    #[test]
    fn test_analysis_defaults_follow_config() {
        let mut config = test_config();
        config.cluster_k = 4;
        config.max_df = 0.8;
        let params = config.analysis_defaults();
        assert_eq!(params.k, 4);
        assert_eq!(params.df_bounds.max_df, 0.8);
        assert_eq!(params.policy.seed, 42);
        assert!(params.validate().is_ok());
    }
}
