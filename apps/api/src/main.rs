mod analysis;
mod config;
mod db;
mod errors;
mod jobs;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::export::ReportExporter;
use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::store::PgJobSource;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skillmap API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (processed postings)
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize S3 / MinIO (report export)
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let defaults = config.analysis_defaults();
    info!(
        "Analysis defaults: df [{}, {}], k={}, seed={}, restarts={}",
        defaults.df_bounds.min_df,
        defaults.df_bounds.max_df,
        defaults.k,
        defaults.policy.seed,
        defaults.policy.restarts
    );

    // Build app state
    let state = AppState {
        jobs: Arc::new(PgJobSource::new(db)),
        exporter: ReportExporter::new(s3, config.s3_bucket.clone()),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "skillmap-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
