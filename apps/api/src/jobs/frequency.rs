//! Skill frequency tables: per-source aggregation, the cross-source merge, and the
//! top-skill counts that feed word-cloud rendering.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::job::{JobRecord, Source};

/// Number of skills shown per source in the word-cloud feed.
pub const WORD_CLOUD_WORDS: usize = 15;

/// One skill's aggregate within one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSkillStats {
    pub skill: String,
    /// Occurrences of the skill across postings (a repeated skill counts twice).
    pub job_count: usize,
    pub avg_min_salary: Option<f64>,
    pub avg_max_salary: Option<f64>,
    pub titles: BTreeSet<String>,
}

/// One row of the merged skill frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFrequency {
    pub skill: String,
    pub job_count: usize,
    pub unique_titles_count: usize,
    pub avg_min_salary: Option<f64>,
    pub avg_max_salary: Option<f64>,
    pub example_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Default)]
struct Accumulator {
    job_count: usize,
    min_sum: f64,
    min_n: usize,
    max_sum: f64,
    max_n: usize,
    titles: BTreeSet<String>,
}

fn mean(sum: f64, n: usize) -> Option<f64> {
    (n > 0).then(|| sum / n as f64)
}

/// Groups the postings of one source by skill (spelling as posted).
pub fn aggregate_source(records: &[JobRecord]) -> Vec<SourceSkillStats> {
    let mut by_skill: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        for skill in &record.skills {
            let acc = by_skill.entry(skill.as_str()).or_default();
            acc.job_count += 1;
            if let Some(min) = record.min_salary {
                acc.min_sum += min;
                acc.min_n += 1;
            }
            if let Some(max) = record.max_salary {
                acc.max_sum += max;
                acc.max_n += 1;
            }
            acc.titles.insert(record.title.clone());
        }
    }

    by_skill
        .into_iter()
        .map(|(skill, acc)| SourceSkillStats {
            skill: skill.to_string(),
            job_count: acc.job_count,
            avg_min_salary: mean(acc.min_sum, acc.min_n),
            avg_max_salary: mean(acc.max_sum, acc.max_n),
            titles: acc.titles,
        })
        .collect()
}

/// Merges per-source aggregates.
///
/// Counts add up, titles are unioned, and each source's salary average is weighted by
/// its job_count. The weighting treats a source average as a sufficient statistic,
/// which only approximates a mean over the raw postings.
pub fn merge_sources(per_source: &[Vec<SourceSkillStats>]) -> Vec<SkillFrequency> {
    let mut merged: HashMap<&str, Accumulator> = HashMap::new();
    for stats in per_source.iter().flatten() {
        let acc = merged.entry(stats.skill.as_str()).or_default();
        acc.job_count += stats.job_count;
        if let Some(avg) = stats.avg_min_salary {
            acc.min_sum += avg * stats.job_count as f64;
            acc.min_n += stats.job_count;
        }
        if let Some(avg) = stats.avg_max_salary {
            acc.max_sum += avg * stats.job_count as f64;
            acc.max_n += stats.job_count;
        }
        acc.titles.extend(stats.titles.iter().cloned());
    }

    let mut table: Vec<SkillFrequency> = merged
        .into_iter()
        .map(|(skill, acc)| SkillFrequency {
            skill: skill.to_string(),
            job_count: acc.job_count,
            unique_titles_count: acc.titles.len(),
            avg_min_salary: mean(acc.min_sum, acc.min_n),
            avg_max_salary: mean(acc.max_sum, acc.max_n),
            example_titles: acc.titles.into_iter().collect(),
        })
        .collect();
    table.sort_by(|a, b| b.job_count.cmp(&a.job_count).then(a.skill.cmp(&b.skill)));
    table
}

/// Aggregates each source separately, then merges.
pub fn skill_frequency_table(records: &[JobRecord]) -> Vec<SkillFrequency> {
    let mut by_source: BTreeMap<Source, Vec<JobRecord>> = BTreeMap::new();
    for record in records {
        by_source.entry(record.source).or_default().push(record.clone());
    }
    let per_source: Vec<Vec<SourceSkillStats>> =
        by_source.values().map(|r| aggregate_source(r)).collect();
    merge_sources(&per_source)
}

/// Most frequent skills, trimmed and lowercased, ties broken by name.
pub fn top_skills(records: &[JobRecord], limit: usize) -> Vec<SkillCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for skill in records.iter().flat_map(|r| &r.skills) {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<SkillCount> = counts
        .into_iter()
        .map(|(skill, count)| SkillCount { skill, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.skill.cmp(&b.skill)));
    ranked.truncate(limit);
    ranked
}
