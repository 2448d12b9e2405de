//! Job store: pluggable, trait-based access to processed postings.
//!
//! Default: `PgJobSource` (one Postgres table per job board).
//! `AppState` holds an `Arc<dyn JobSource>` so handlers never see the backend.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::analysis::error::PipelineError;
use crate::models::job::{JobRecord, JobRow, QuarantineReason, Source};

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Rows of `source` whose must-have skill list exists and is non-empty.
    async fn fetch_jobs(&self, source: Source) -> Result<Vec<JobRow>, PipelineError>;
}

pub struct PgJobSource {
    pool: PgPool,
}

impl PgJobSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobSource for PgJobSource {
    async fn fetch_jobs(&self, source: Source) -> Result<Vec<JobRow>, PipelineError> {
        // table names come from the closed `Source` enum, never from input
        let query = format!(
            r#"
            SELECT id, job_title, company_name, must_have_skills, min_salary, max_salary
            FROM {}
            WHERE must_have_skills IS NOT NULL AND cardinality(must_have_skills) > 0
            ORDER BY id
            "#,
            source.table()
        );
        sqlx::query_as::<_, JobRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::DataAccess {
                source_label: source.label().to_string(),
                message: e.to_string(),
            })
    }
}

/// Validated records plus what was kept out at the boundary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadedJobs {
    #[serde(skip)]
    pub records: Vec<JobRecord>,
    pub loaded: usize,
    pub quarantined: usize,
}

impl LoadedJobs {
    pub fn absorb(&mut self, rows: Vec<JobRow>, source: Source) {
        for row in rows {
            match row.into_record(source) {
                Ok(record) => {
                    self.records.push(record);
                    self.loaded += 1;
                }
                Err(reason) => {
                    self.quarantined += 1;
                    log_quarantine(source, reason);
                }
            }
        }
    }
}

fn log_quarantine(source: Source, reason: QuarantineReason) {
    warn!("Quarantined {source} posting: {reason:?}");
}

/// Loads and validates postings from each requested source, in order.
pub async fn load_jobs(
    store: &dyn JobSource,
    sources: &[Source],
) -> Result<LoadedJobs, PipelineError> {
    let mut loaded = LoadedJobs::default();
    for &source in sources {
        let rows = store.fetch_jobs(source).await?;
        let before = loaded.loaded;
        loaded.absorb(rows, source);
        info!("Loaded {} postings from {source}", loaded.loaded - before);
    }
    Ok(loaded)
}
