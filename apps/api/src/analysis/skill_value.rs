//! Skill Value Analyzer: ranks terms by salary-weighted centroid mass against demand.
//!
//! salary_correlation(term) = Σ_c centroid_weight(c, term) × median_salary(c)
//! demand(term) = share of jobs whose skill text contains the term as a whole word

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::assignment::ClusteringResult;
use crate::analysis::corpus::SkillCorpus;
use crate::analysis::error::PipelineError;
use crate::analysis::vectorizer::VectorSpace;

/// Default market-presence threshold.
pub const MIN_DEMAND: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillValueScore {
    pub skill: String,
    pub salary_correlation: f64,
    pub demand: f64,
}

/// Fraction of `texts` containing `term` bounded by word boundaries.
pub fn demand(term: &str, texts: &[String]) -> Result<f64, PipelineError> {
    if texts.is_empty() {
        return Ok(0.0);
    }
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(term)))
        .map_err(|e| PipelineError::InvalidConfig(format!("demand pattern for '{term}': {e}")))?;
    let hits = texts.iter().filter(|t| pattern.is_match(t)).count();
    Ok(hits as f64 / texts.len() as f64)
}

/// Scores every vocabulary term, keeps those with `demand >= min_demand`, and sorts
/// by descending salary correlation. Equal scores keep vocabulary order.
///
/// `medians` is indexed by cluster id; a cluster without salary data contributes 0.
pub fn rank_skills(
    space: &VectorSpace,
    clustering: &ClusteringResult,
    medians: &[Option<f64>],
    corpus: &SkillCorpus,
    min_demand: f64,
) -> Result<Vec<SkillValueScore>, PipelineError> {
    let mut ranking = Vec::new();

    for (col, term) in space.terms().iter().enumerate() {
        let salary_correlation: f64 = clustering
            .centroids
            .column(col)
            .iter()
            .enumerate()
            .map(|(cluster, weight)| weight * medians.get(cluster).copied().flatten().unwrap_or(0.0))
            .sum();

        let demand = demand(term, corpus.texts())?;
        if demand >= min_demand {
            ranking.push(SkillValueScore {
                skill: term.clone(),
                salary_correlation,
                demand,
            });
        }
    }

    ranking.sort_by(|a, b| {
        b.salary_correlation
            .partial_cmp(&a.salary_correlation)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    info!(
        "Skill value ranking: {} of {} terms meet demand >= {}",
        ranking.len(),
        space.dim(),
        min_demand
    );
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::assignment::assign_clusters;
    use crate::analysis::corpus::fixtures::{four_jobs, job};
    use crate::analysis::kmeans::ClusterPolicy;
    use crate::analysis::vectorizer::{DfBounds, SkillVectorizer};

    fn texts(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_demand_uses_word_boundaries() {
        let t = texts(&["java spring", "javascript react", "node.js java"]);
        assert!((demand("java", &t).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(demand("js", &t).unwrap(), 1.0 / 3.0);
        assert_eq!(demand("rust", &t).unwrap(), 0.0);
    }

    #[test]
    fn test_demand_escapes_pattern_characters() {
        let t = texts(&["c++ python", "cxx"]);
        assert_eq!(demand("c+", &t).unwrap(), 0.0);
        assert_eq!(demand("python", &t).unwrap(), 0.5);
    }

    #[test]
    fn test_demand_is_a_fraction() {
        let t = texts(&["sql", "sql sql", "go"]);
        let d = demand("sql", &t).unwrap();
        assert!((0.0..=1.0).contains(&d));
        assert!((d - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_rewards_high_salary_clusters() {
        let corpus = SkillCorpus::build(four_jobs()).unwrap();
        let space = SkillVectorizer::new(DfBounds {
            min_df: 0.0,
            max_df: 1.0,
        })
        .unwrap()
        .fit_transform(&corpus)
        .unwrap();
        let clustering = assign_clusters(&space, 2, &ClusterPolicy::default()).unwrap();

        // the docker/kubernetes cluster pays 50k, the python/sql one 10k
        let mut medians = vec![None; 2];
        medians[clustering.labels[0]] = Some(10_000.0);
        medians[clustering.labels[3]] = Some(50_000.0);

        let ranking = rank_skills(&space, &clustering, &medians, &corpus, MIN_DEMAND).unwrap();
        assert_eq!(ranking.len(), 5);
        assert!(ranking
            .windows(2)
            .all(|w| w[0].salary_correlation >= w[1].salary_correlation));

        let position = |skill: &str| ranking.iter().position(|s| s.skill == skill).unwrap();
        assert!(position("kubernetes") < position("sql"));
        assert!(position("docker") < position("python"));

        let java = &ranking[position("java")];
        assert_eq!(java.demand, 0.5);
    }

    #[test]
    fn test_low_demand_terms_are_filtered() {
        let mut records: Vec<_> = (0..20).map(|_| job(&["sql"], None)).collect();
        records.push(job(&["sql", "cobol"], None));
        let corpus = SkillCorpus::build(records).unwrap();
        let space = SkillVectorizer::new(DfBounds {
            min_df: 0.0,
            max_df: 1.0,
        })
        .unwrap()
        .fit_transform(&corpus)
        .unwrap();
        let clustering = assign_clusters(&space, 1, &ClusterPolicy::default()).unwrap();

        let ranking = rank_skills(&space, &clustering, &[Some(1000.0)], &corpus, MIN_DEMAND).unwrap();
        // cobol appears in 1 of 21 jobs (< 5%)
        let skills: Vec<&str> = ranking.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, vec!["sql"]);
    }

    #[test]
    fn test_missing_medians_contribute_nothing() {
        let corpus = SkillCorpus::build(four_jobs()).unwrap();
        let space = SkillVectorizer::new(DfBounds {
            min_df: 0.0,
            max_df: 1.0,
        })
        .unwrap()
        .fit_transform(&corpus)
        .unwrap();
        let clustering = assign_clusters(&space, 2, &ClusterPolicy::default()).unwrap();
        let ranking = rank_skills(&space, &clustering, &[None, None], &corpus, 0.0).unwrap();
        assert!(ranking.iter().all(|s| s.salary_correlation == 0.0));
        // stable sort: all ties stay in vocabulary order
        let skills: Vec<&str> = ranking.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, space.terms().iter().map(String::as_str).collect::<Vec<_>>());
    }
}
