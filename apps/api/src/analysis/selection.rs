//! Cluster-count selection: elbow distortion and silhouette per candidate k.
//!
//! The sweep reports; it never picks k. Each k is fitted on its own blocking worker with
//! its own seeded generator, and every k gets exactly one entry in the result table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ndarray::Array2;
use tokio::task::JoinSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::error::PipelineError;
use crate::analysis::kmeans::{euclidean, fit_kmeans, ClusterPolicy};

/// Inclusive range of candidate cluster counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KRange {
    pub min: usize,
    pub max: usize,
}

impl Default for KRange {
    fn default() -> Self {
        Self { min: 2, max: 19 }
    }
}

impl KRange {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min == 0 || self.min > self.max {
            return Err(PipelineError::InvalidConfig(format!(
                "k range must satisfy 1 <= min <= max (got {}..={})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn values(&self) -> Vec<usize> {
        (self.min..=self.max).collect()
    }
}

/// Quality metrics for one candidate k. `None` marks a metric that is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMetrics {
    pub k: usize,
    /// Mean Euclidean distance from each job to its nearest centroid.
    pub distortion: Option<f64>,
    pub silhouette: Option<f64>,
    /// Why a metric is missing, if one is.
    pub note: Option<String>,
}

impl KMetrics {
    fn unavailable(k: usize, note: String) -> Self {
        Self {
            k,
            distortion: None,
            silhouette: None,
            note: Some(note),
        }
    }
}

/// Fits one k and computes both metrics.
pub fn evaluate_k(matrix: &Array2<f64>, k: usize, policy: &ClusterPolicy) -> KMetrics {
    let fit = match fit_kmeans(matrix, k, policy) {
        Ok(fit) => fit,
        Err(e) => {
            warn!("k={k}: {e}");
            return KMetrics::unavailable(k, e.to_string());
        }
    };

    let n = fit.nearest_distances.len();
    let distortion = fit.nearest_distances.iter().sum::<f64>() / n as f64;
    let silhouette = silhouette_score(matrix, &fit.labels);
    let note = silhouette
        .is_none()
        .then(|| format!("silhouette undefined for k={k} over {n} jobs (needs 2 <= clusters < jobs)"));

    debug!("k={k}, distortion={distortion:.4}, silhouette={silhouette:?}");
    KMetrics {
        k,
        distortion: Some(distortion),
        silhouette,
        note,
    }
}

/// Mean silhouette coefficient over all rows.
///
/// Returns `None` unless the number of non-empty clusters is at least 2 and below the
/// number of rows. A row alone in its cluster scores 0.
pub fn silhouette_score(matrix: &Array2<f64>, labels: &[usize]) -> Option<f64> {
    let n = matrix.nrows();
    let clusters: BTreeSet<usize> = labels.iter().copied().collect();
    if clusters.len() < 2 || clusters.len() >= n {
        return None;
    }

    let mut total = 0.0;
    for i in 0..n {
        let mut sums: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
        for j in 0..n {
            if i == j {
                continue;
            }
            let entry = sums.entry(labels[j]).or_insert((0.0, 0));
            entry.0 += euclidean(matrix.row(i), matrix.row(j));
            entry.1 += 1;
        }

        let own = labels[i];
        let Some(&(own_sum, own_count)) = sums.get(&own) else {
            // singleton cluster
            continue;
        };
        let a = own_sum / own_count as f64;
        let b = sums
            .iter()
            .filter(|(label, _)| **label != own)
            .map(|(_, (sum, count))| sum / *count as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }
    Some(total / n as f64)
}

/// Evaluates every candidate k concurrently and merges the results by k.
pub async fn sweep_k(
    matrix: Arc<Array2<f64>>,
    ks: &[usize],
    policy: ClusterPolicy,
) -> BTreeMap<usize, KMetrics> {
    let candidates: BTreeSet<usize> = ks.iter().copied().collect();
    info!("Evaluating {} candidate k values...", candidates.len());

    let mut workers = JoinSet::new();
    for &k in &candidates {
        let matrix = Arc::clone(&matrix);
        workers.spawn_blocking(move || (k, evaluate_k(&matrix, k, &policy)));
    }

    let mut table = BTreeMap::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((k, metrics)) => {
                if let Some(s) = metrics.silhouette {
                    info!("k={k}, silhouette score={s:.3}");
                }
                table.insert(k, metrics);
            }
            Err(e) => warn!("k-sweep worker failed: {e}"),
        }
    }
    for k in candidates {
        table
            .entry(k)
            .or_insert_with(|| KMetrics::unavailable(k, "worker failed".to_string()));
    }
    table
}
