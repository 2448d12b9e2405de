//! Axum route handlers for the skill frequency API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::frequency::{
    skill_frequency_table, top_skills, SkillCount, SkillFrequency, WORD_CLOUD_WORDS,
};
use crate::jobs::store::load_jobs;
use crate::models::job::{parse_source_list, Source};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FrequencyQuery {
    /// Comma-separated source labels; all sources when absent.
    pub sources: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FrequencyResponse {
    pub sources: Vec<Source>,
    pub skills: Vec<SkillFrequency>,
}

#[derive(Debug, Deserialize)]
pub struct TopSkillsQuery {
    pub source: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopSkillsResponse {
    pub source: Source,
    pub skills: Vec<SkillCount>,
}

/// GET /api/v1/skills/frequency
pub async fn handle_skill_frequency(
    State(state): State<AppState>,
    Query(params): Query<FrequencyQuery>,
) -> Result<Json<FrequencyResponse>, AppError> {
    let sources = parse_source_list(params.sources.as_deref())?;
    let loaded = load_jobs(state.jobs.as_ref(), &sources).await?;
    Ok(Json(FrequencyResponse {
        skills: skill_frequency_table(&loaded.records),
        sources,
    }))
}

/// GET /api/v1/skills/top
///
/// Word-cloud feed: the most frequent skills of one source.
pub async fn handle_top_skills(
    State(state): State<AppState>,
    Query(params): Query<TopSkillsQuery>,
) -> Result<Json<TopSkillsResponse>, AppError> {
    let source: Source = params.source.parse()?;
    let limit = params.limit.unwrap_or(WORD_CLOUD_WORDS);
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    let loaded = load_jobs(state.jobs.as_ref(), &[source]).await?;
    Ok(Json(TopSkillsResponse {
        source,
        skills: top_skills(&loaded.records, limit),
    }))
}
