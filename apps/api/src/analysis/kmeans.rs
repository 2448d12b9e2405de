//! Seeded k-means fitting shared by k selection and cluster assignment.

use std::panic::{self, AssertUnwindSafe};

use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array2, ArrayView1};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::error::PipelineError;

/// Restart and iteration policy. A fresh generator is seeded for every fit, so a
/// fit never depends on which other fits ran before it or alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPolicy {
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for ClusterPolicy {
    fn default() -> Self {
        Self {
            seed: 42,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl ClusterPolicy {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.restarts == 0 || self.max_iterations == 0 {
            return Err(PipelineError::InvalidConfig(
                "restarts and max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be positive (got {})",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of one k-means fit: centroids plus each job's nearest centroid.
#[derive(Debug, Clone)]
pub struct FittedClusters {
    pub k: usize,
    pub centroids: Array2<f64>,
    pub labels: Vec<usize>,
    /// Euclidean distance from each job to its assigned centroid.
    pub nearest_distances: Vec<f64>,
}

/// Index of the closest centroid; the lowest index wins ties.
fn nearest_centroid(job: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    centroids
        .rows()
        .into_iter()
        .map(|c| euclidean(job, c))
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
        .0
}

pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Fits k-means with `k` clusters over the rows of `matrix`.
///
/// Requires `1 <= k <= rows`. Each job is labeled with its nearest fitted centroid,
/// then every non-empty cluster's centroid is set to the mean of its members.
/// Distances are measured to those final centroids.
pub fn fit_kmeans(
    matrix: &Array2<f64>,
    k: usize,
    policy: &ClusterPolicy,
) -> Result<FittedClusters, PipelineError> {
    let rows = matrix.nrows();
    if k == 0 || k > rows {
        return Err(PipelineError::ClusteringFailed {
            k,
            reason: format!("k must be between 1 and the number of jobs ({rows})"),
        });
    }
    policy.validate()?;

    let dataset = DatasetBase::from(matrix.clone());
    let rng = Xoshiro256Plus::seed_from_u64(policy.seed);
    let fitted = panic::catch_unwind(AssertUnwindSafe(|| {
        KMeans::params_with_rng(k, rng)
            .n_runs(policy.restarts)
            .max_n_iterations(policy.max_iterations)
            .tolerance(policy.tolerance)
            .fit(&dataset)
    }));

    let model = match fitted {
        Ok(Ok(model)) => model,
        Ok(Err(e)) => {
            return Err(PipelineError::ClusteringFailed {
                k,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(PipelineError::ClusteringFailed {
                k,
                reason: "k-means fit panicked".to_string(),
            })
        }
    };

    let mut centroids = model.centroids().to_owned();
    let labels: Vec<usize> = matrix
        .rows()
        .into_iter()
        .map(|job| nearest_centroid(job, &centroids))
        .collect();

    // linfa's m_k-means update folds the previous centroid into each mean.
    // Report plain member means instead; an empty cluster keeps its fitted centroid.
    let mut counts = vec![0usize; k];
    let mut sums = Array2::<f64>::zeros(centroids.dim());
    for (job, &label) in matrix.rows().into_iter().zip(&labels) {
        counts[label] += 1;
        sums.row_mut(label).scaled_add(1.0, &job);
    }
    for (cluster, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = sums.row(cluster).mapv(|v| v / count as f64);
            centroids.row_mut(cluster).assign(&mean);
        }
    }

    let nearest_distances = matrix
        .rows()
        .into_iter()
        .zip(&labels)
        .map(|(job, &label)| euclidean(job, centroids.row(label)))
        .collect();

    debug!("Fitted k-means with k={k} over {rows} jobs");
    Ok(FittedClusters {
        k,
        centroids,
        labels,
        nearest_distances,
    })
}
