//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::analysis::export::ExportedReport;
use crate::analysis::kmeans::ClusterPolicy;
use crate::analysis::pipeline::{
    run_analysis, run_k_sweep, AnalysisParams, AnalysisReport, KSweepReport, ParamsOverride,
};
use crate::analysis::selection::KRange;
use crate::analysis::vectorizer::DfBounds;
use crate::errors::AppError;
use crate::jobs::store::{load_jobs, LoadedJobs};
use crate::models::job::{JobRecord, JobRow, Source};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    /// Sources to load; every source when empty.
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub params: ParamsOverride,
    #[serde(default)]
    pub export: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdhocRequest {
    pub source: Source,
    pub jobs: Vec<JobRow>,
    #[serde(default)]
    pub params: ParamsOverride,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub ingest: LoadedJobs,
    pub report: AnalysisReport,
    pub export: Option<ExportedReport>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    #[serde(default)]
    pub sources: Vec<Source>,
    pub min_df: Option<f64>,
    pub max_df: Option<f64>,
    pub k_min: Option<usize>,
    pub k_max: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub ingest: LoadedJobs,
    pub sweep: KSweepReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis/runs
///
/// Loads postings from the store, runs the full pipeline, and optionally publishes
/// the report to object storage.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let mut ingest = load_jobs(state.jobs.as_ref(), &sources_or_all(request.sources)).await?;
    let params = request.params.apply(state.config.analysis_defaults());
    let report = run_blocking(std::mem::take(&mut ingest.records), params).await?;

    let export = if request.export {
        Some(state.exporter.export(&report).await?)
    } else {
        None
    };

    Ok(Json(RunResponse {
        ingest,
        report,
        export,
    }))
}

/// POST /api/v1/analysis/adhoc
///
/// Runs the pipeline over postings supplied in the request body.
pub async fn handle_adhoc(
    State(state): State<AppState>,
    Json(request): Json<AdhocRequest>,
) -> Result<Json<RunResponse>, AppError> {
    if request.jobs.is_empty() {
        return Err(AppError::Validation("jobs cannot be empty".to_string()));
    }
    let mut ingest = LoadedJobs::default();
    ingest.absorb(request.jobs, request.source);
    let params = request.params.apply(state.config.analysis_defaults());
    let report = run_blocking(std::mem::take(&mut ingest.records), params).await?;

    Ok(Json(RunResponse {
        ingest,
        report,
        export: None,
    }))
}

/// POST /api/v1/analysis/k-sweep
///
/// Reports distortion and silhouette for each candidate k. Picking k is left to the caller.
pub async fn handle_k_sweep(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<SweepResponse>, AppError> {
    let defaults = state.config.analysis_defaults();
    let df_bounds = DfBounds {
        min_df: request.min_df.unwrap_or(defaults.df_bounds.min_df),
        max_df: request.max_df.unwrap_or(defaults.df_bounds.max_df),
    };
    let range = KRange {
        min: request.k_min.unwrap_or(KRange::default().min),
        max: request.k_max.unwrap_or(KRange::default().max),
    };
    let policy: ClusterPolicy = defaults.policy;

    let mut ingest = load_jobs(state.jobs.as_ref(), &sources_or_all(request.sources)).await?;
    let sweep = run_k_sweep(std::mem::take(&mut ingest.records), df_bounds, range, policy).await?;
    Ok(Json(SweepResponse { ingest, sweep }))
}

fn sources_or_all(sources: Vec<Source>) -> Vec<Source> {
    if sources.is_empty() {
        Source::ALL.to_vec()
    } else {
        sources
    }
}

/// The pipeline is CPU-bound; keep it off the async workers.
async fn run_blocking(
    records: Vec<JobRecord>,
    params: AnalysisParams,
) -> Result<AnalysisReport, AppError> {
    tokio::task::spawn_blocking(move || run_analysis(records, &params))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("analysis worker failed: {e}")))?
        .map_err(AppError::from)
}
