use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::error::PipelineError;

/// Job boards that feed the analysis. Closed set: every label is matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    NoFluffJobs,
    JustJoinIt,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::NoFluffJobs, Source::JustJoinIt];

    pub fn label(self) -> &'static str {
        match self {
            Source::NoFluffJobs => "no_fluff_jobs",
            Source::JustJoinIt => "just_join_it",
        }
    }

    /// Table holding the processed postings of this board.
    pub fn table(self) -> &'static str {
        match self {
            Source::NoFluffJobs => "jobs_processed",
            Source::JustJoinIt => "jobs_processed_jj",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.label() == wanted)
            .ok_or_else(|| PipelineError::UnknownSource(s.trim().to_string()))
    }
}

/// Parses a comma-separated list of source labels. An empty list means every source.
pub fn parse_source_list(raw: Option<&str>) -> Result<Vec<Source>, PipelineError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Source::ALL.to_vec());
    };
    let mut sources = Vec::new();
    for label in raw.split(',') {
        let source: Source = label.parse()?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}

/// A posting as stored by the ingestion side. Every field is optional until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub must_have_skills: Option<Vec<String>>,
    #[serde(default)]
    pub min_salary: Option<f64>,
    #[serde(default)]
    pub max_salary: Option<f64>,
}

/// Why a row was kept away from the analysis core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    MissingTitle,
    MissingCompany,
    NoSkills,
}

/// A validated job posting. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    /// Must-have skills in posting order, trimmed, duplicates preserved.
    pub skills: Vec<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub source: Source,
}

impl JobRecord {
    /// Midpoint of the advertised range, when both ends are present.
    pub fn avg_salary(&self) -> Option<f64> {
        match (self.min_salary, self.max_salary) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            _ => None,
        }
    }
}

impl JobRow {
    /// Validates the row at the ingestion boundary.
    pub fn into_record(self, source: Source) -> Result<JobRecord, QuarantineReason> {
        let title = non_blank(self.job_title).ok_or(QuarantineReason::MissingTitle)?;
        let company = non_blank(self.company_name).ok_or(QuarantineReason::MissingCompany)?;
        let skills: Vec<String> = self
            .must_have_skills
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if skills.is_empty() {
            return Err(QuarantineReason::NoSkills);
        }

        Ok(JobRecord {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            title,
            company,
            skills,
            min_salary: self.min_salary.filter(|v| v.is_finite()),
            max_salary: self.max_salary.filter(|v| v.is_finite()),
            source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
