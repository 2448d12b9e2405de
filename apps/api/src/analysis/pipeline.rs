//! Stateless orchestrator for one analysis run.
//!
//! records → SkillCorpus → VectorSpace → ClusteringResult → SalaryStatsResult → ranking.
//! Nothing is cached between runs: every artifact belongs to the snapshot it was built from.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::assignment::{assign_clusters, ClusterAssignment, ClusterSummary};
use crate::analysis::corpus::SkillCorpus;
use crate::analysis::error::PipelineError;
use crate::analysis::kmeans::ClusterPolicy;
use crate::analysis::salary::{aggregate_salaries, ClusterSalaryStats, IqrFence};
use crate::analysis::selection::{sweep_k, KMetrics, KRange};
use crate::analysis::skill_value::{rank_skills, SkillValueScore, MIN_DEMAND};
use crate::analysis::vectorizer::{DfBounds, SkillVectorizer, VocabularyTerm};
use crate::models::job::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub df_bounds: DfBounds,
    pub k: usize,
    pub policy: ClusterPolicy,
    pub min_demand: f64,
    /// Truncates the skill value ranking when set.
    pub top_n: Option<usize>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            df_bounds: DfBounds::default(),
            k: 12,
            policy: ClusterPolicy::default(),
            min_demand: MIN_DEMAND,
            top_n: None,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.df_bounds.validate()?;
        self.policy.validate()?;
        if self.k == 0 {
            return Err(PipelineError::InvalidConfig("k must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_demand) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_demand must lie in [0, 1] (got {})",
                self.min_demand
            )));
        }
        Ok(())
    }
}

/// Per-request overrides layered on top of the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamsOverride {
    pub min_df: Option<f64>,
    pub max_df: Option<f64>,
    pub k: Option<usize>,
    pub seed: Option<u64>,
    pub restarts: Option<usize>,
    pub max_iterations: Option<u64>,
    pub min_demand: Option<f64>,
    pub top_n: Option<usize>,
}

impl ParamsOverride {
    pub fn apply(&self, base: AnalysisParams) -> AnalysisParams {
        AnalysisParams {
            df_bounds: DfBounds {
                min_df: self.min_df.unwrap_or(base.df_bounds.min_df),
                max_df: self.max_df.unwrap_or(base.df_bounds.max_df),
            },
            k: self.k.unwrap_or(base.k),
            policy: ClusterPolicy {
                seed: self.seed.unwrap_or(base.policy.seed),
                restarts: self.restarts.unwrap_or(base.policy.restarts),
                max_iterations: self.max_iterations.unwrap_or(base.policy.max_iterations),
                tolerance: base.policy.tolerance,
            },
            min_demand: self.min_demand.unwrap_or(base.min_demand),
            top_n: self.top_n.or(base.top_n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub params: AnalysisParams,
    pub job_count: usize,
    pub vocabulary_size: usize,
    pub vocabulary: Vec<VocabularyTerm>,
    pub clusters: Vec<ClusterSummary>,
    pub assignments: Vec<ClusterAssignment>,
    pub salary_stats: Vec<ClusterSalaryStats>,
    pub salary_fence: Option<IqrFence>,
    pub jobs_missing_salary: usize,
    pub salary_outliers_removed: usize,
    pub skill_value: Vec<SkillValueScore>,
}

/// Runs every stage in order over one snapshot of records.
pub fn run_analysis(
    records: Vec<JobRecord>,
    params: &AnalysisParams,
) -> Result<AnalysisReport, PipelineError> {
    params.validate()?;

    let corpus = SkillCorpus::build(records)?;
    let space = SkillVectorizer::new(params.df_bounds)?.fit_transform(&corpus)?;
    let clustering = assign_clusters(&space, params.k, &params.policy)?;
    let salary = aggregate_salaries(corpus.jobs(), &clustering.labels, clustering.k);
    let medians = salary.median_by_cluster(clustering.k);
    let mut skill_value = rank_skills(&space, &clustering, &medians, &corpus, params.min_demand)?;
    if let Some(n) = params.top_n {
        skill_value.truncate(n);
    }

    let report = AnalysisReport {
        run_id: Uuid::new_v4(),
        created_at: Utc::now(),
        params: *params,
        job_count: corpus.len(),
        vocabulary_size: space.dim(),
        vocabulary: space.vocabulary(),
        assignments: clustering.assignments(&corpus),
        clusters: clustering.summaries,
        salary_stats: salary.clusters,
        salary_fence: salary.fence,
        jobs_missing_salary: salary.missing_salary,
        salary_outliers_removed: salary.outliers_removed,
        skill_value,
    };
    info!(
        "Analysis run {} complete: {} jobs, {} terms, k={}",
        report.run_id, report.job_count, report.vocabulary_size, params.k
    );
    Ok(report)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KSweepReport {
    pub job_count: usize,
    pub vocabulary_size: usize,
    pub df_bounds: DfBounds,
    pub policy: ClusterPolicy,
    pub metrics: BTreeMap<usize, KMetrics>,
}

/// Vectorizes the records and evaluates every k in `range`.
pub async fn run_k_sweep(
    records: Vec<JobRecord>,
    df_bounds: DfBounds,
    range: KRange,
    policy: ClusterPolicy,
) -> Result<KSweepReport, PipelineError> {
    range.validate()?;
    policy.validate()?;

    let corpus = SkillCorpus::build(records)?;
    let space = SkillVectorizer::new(df_bounds)?.fit_transform(&corpus)?;
    let matrix = Arc::new(space.matrix().clone());
    let metrics = sweep_k(matrix, &range.values(), policy).await;

    Ok(KSweepReport {
        job_count: corpus.len(),
        vocabulary_size: space.dim(),
        df_bounds,
        policy,
        metrics,
    })
}
