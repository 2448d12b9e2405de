//! Skill corpus: one lowercased, space-joined skill text per job.

use tracing::info;

use crate::analysis::error::PipelineError;
use crate::models::job::JobRecord;

/// Jobs and their skill texts, aligned by position.
#[derive(Debug, Clone)]
pub struct SkillCorpus {
    jobs: Vec<JobRecord>,
    texts: Vec<String>,
}

impl SkillCorpus {
    /// Drops jobs without skills and joins the remaining skills into one text per job.
    ///
    /// Order is preserved and repeated skills are kept as they appear in the posting.
    pub fn build(records: Vec<JobRecord>) -> Result<Self, PipelineError> {
        let total = records.len();
        let jobs: Vec<JobRecord> = records
            .into_iter()
            .filter(|r| !r.skills.is_empty())
            .collect();

        if jobs.is_empty() {
            return Err(PipelineError::CorpusEmpty);
        }

        let texts = jobs.iter().map(|job| skill_text(&job.skills)).collect();

        info!(
            "Skill corpus built: {} jobs ({} dropped without skills)",
            jobs.len(),
            total - jobs.len()
        );
        Ok(Self { jobs, texts })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}

fn skill_text(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use uuid::Uuid;

    use crate::models::job::{JobRecord, Source};

    pub fn job(skills: &[&str], salary: Option<(f64, f64)>) -> JobRecord {
        JobRecord {
            id: Uuid::new_v4(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            min_salary: salary.map(|(min, _)| min),
            max_salary: salary.map(|(_, max)| max),
            source: Source::NoFluffJobs,
        }
    }

    /// Two disjoint skill pairs bridged by `java`.
    pub fn four_jobs() -> Vec<JobRecord> {
        vec![
            job(&["python", "sql"], Some((10_000.0, 14_000.0))),
            job(&["python", "java"], Some((11_000.0, 15_000.0))),
            job(&["java", "docker"], Some((20_000.0, 26_000.0))),
            job(&["docker", "kubernetes"], Some((22_000.0, 28_000.0))),
        ]
    }
}
