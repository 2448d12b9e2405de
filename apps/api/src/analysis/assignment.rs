//! Cluster Assigner: fits the chosen k and describes each cluster by its top terms.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::corpus::SkillCorpus;
use crate::analysis::error::PipelineError;
use crate::analysis::kmeans::{fit_kmeans, ClusterPolicy};
use crate::analysis::vectorizer::VectorSpace;

/// Number of representative terms reported per cluster.
pub const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

/// Human-readable signature of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub size: usize,
    pub top_terms: Vec<TermWeight>,
}

/// One row of the cluster assignment export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub job_id: Uuid,
    pub cluster_id: usize,
}

#[derive(Debug, Clone)]
pub struct ClusteringResult {
    pub k: usize,
    /// Cluster id per job, aligned with the corpus.
    pub labels: Vec<usize>,
    /// One row per cluster, one column per vocabulary term.
    pub centroids: Array2<f64>,
    pub summaries: Vec<ClusterSummary>,
}

impl ClusteringResult {
    pub fn assignments(&self, corpus: &SkillCorpus) -> Vec<ClusterAssignment> {
        corpus
            .jobs()
            .iter()
            .zip(&self.labels)
            .map(|(job, &cluster_id)| ClusterAssignment {
                job_id: job.id,
                cluster_id,
            })
            .collect()
    }
}

/// Fits `k` clusters over the job vectors and ranks each centroid's terms.
pub fn assign_clusters(
    space: &VectorSpace,
    k: usize,
    policy: &ClusterPolicy,
) -> Result<ClusteringResult, PipelineError> {
    let fit = fit_kmeans(space.matrix(), k, policy)?;

    let mut sizes = vec![0usize; fit.k];
    for &label in &fit.labels {
        sizes[label] += 1;
    }

    let summaries: Vec<ClusterSummary> = fit
        .centroids
        .rows()
        .into_iter()
        .enumerate()
        .map(|(cluster_id, centroid)| {
            let size = sizes[cluster_id];
            // An empty cluster has no members to describe.
            let signature = if size == 0 {
                Vec::new()
            } else {
                top_terms(centroid, space.terms(), TOP_TERMS)
            };
            ClusterSummary {
                cluster_id,
                size,
                top_terms: signature,
            }
        })
        .collect();

    info!("Jobs distribution per cluster:");
    for summary in &summaries {
        if summary.size == 0 {
            warn!("Cluster {}: no jobs assigned", summary.cluster_id);
            continue;
        }
        let names: Vec<&str> = summary.top_terms.iter().map(|t| t.term.as_str()).collect();
        info!(
            "Cluster {}: {} jobs, representative skills: {}",
            summary.cluster_id,
            summary.size,
            names.join(", ")
        );
    }

    Ok(ClusteringResult {
        k: fit.k,
        labels: fit.labels,
        centroids: fit.centroids,
        summaries,
    })
}

/// Top `n` terms by descending centroid weight. Equal weights keep vocabulary order.
pub fn top_terms(centroid: ArrayView1<f64>, terms: &[String], n: usize) -> Vec<TermWeight> {
    let mut ranked: Vec<(usize, f64)> = centroid.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(n)
        .map(|(col, weight)| TermWeight {
            term: terms[col].clone(),
            weight,
        })
        .collect()
}
