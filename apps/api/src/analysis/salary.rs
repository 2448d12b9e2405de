//! Salary statistics per cluster, after one global upper-tail IQR filter.
//!
//! The fence is computed over every job with a full salary range before grouping,
//! so a cluster is judged against the whole market, not against itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::job::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub upper: f64,
}

impl IqrFence {
    /// Quartiles over `values`; `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            upper: q3 + 1.5 * iqr,
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryDataStatus {
    Available,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSalaryStats {
    pub cluster_id: usize,
    pub status: SalaryDataStatus,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation; needs at least two rows.
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStatsResult {
    /// Clusters with data by descending median, then clusters without data by id.
    pub clusters: Vec<ClusterSalaryStats>,
    pub fence: Option<IqrFence>,
    /// Jobs left out because min or max salary was missing.
    pub missing_salary: usize,
    pub outliers_removed: usize,
}

impl SalaryStatsResult {
    /// Median per cluster id, `None` where the cluster has no salary data.
    pub fn median_by_cluster(&self, k: usize) -> Vec<Option<f64>> {
        let mut medians = vec![None; k];
        for stats in &self.clusters {
            if stats.cluster_id < k {
                medians[stats.cluster_id] = stats.median;
            }
        }
        medians
    }
}

/// Computes outlier-filtered salary statistics for `k` clusters.
///
/// `labels` is aligned with `jobs`.
pub fn aggregate_salaries(jobs: &[JobRecord], labels: &[usize], k: usize) -> SalaryStatsResult {
    let observed: Vec<(usize, f64)> = jobs
        .iter()
        .zip(labels)
        .filter_map(|(job, &cluster)| job.avg_salary().map(|avg| (cluster, avg)))
        .collect();
    let missing_salary = jobs.len() - observed.len();

    let values: Vec<f64> = observed.iter().map(|(_, avg)| *avg).collect();
    let fence = IqrFence::from_values(&values);

    let retained: Vec<(usize, f64)> = match fence {
        Some(f) => observed
            .iter()
            .copied()
            .filter(|(_, avg)| *avg <= f.upper)
            .collect(),
        None => Vec::new(),
    };
    let outliers_removed = observed.len() - retained.len();

    let mut by_cluster: BTreeMap<usize, Vec<f64>> = (0..k).map(|c| (c, Vec::new())).collect();
    for (cluster, avg) in retained {
        by_cluster.entry(cluster).or_default().push(avg);
    }

    let (mut with_data, without_data): (Vec<_>, Vec<_>) = by_cluster
        .into_iter()
        .map(|(cluster_id, values)| describe(cluster_id, values))
        .partition(|s| s.status == SalaryDataStatus::Available);

    with_data.sort_by(|a, b| {
        b.median
            .partial_cmp(&a.median)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cluster_id.cmp(&b.cluster_id))
    });
    with_data.extend(without_data);

    info!(
        "Salary statistics: {} jobs with salary, {} missing, {} outliers removed (fence {:?})",
        observed.len(),
        missing_salary,
        outliers_removed,
        fence.map(|f| f.upper)
    );

    SalaryStatsResult {
        clusters: with_data,
        fence,
        missing_salary,
        outliers_removed,
    }
}

fn describe(cluster_id: usize, mut values: Vec<f64>) -> ClusterSalaryStats {
    let count = values.len();
    if count == 0 {
        return ClusterSalaryStats {
            cluster_id,
            status: SalaryDataStatus::NoData,
            count,
            mean: None,
            median: None,
            std_dev: None,
        };
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mean = values.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    });

    ClusterSalaryStats {
        cluster_id,
        status: SalaryDataStatus::Available,
        count,
        mean: Some(mean),
        median: Some(quantile(&values, 0.5)),
        std_dev,
    }
}
