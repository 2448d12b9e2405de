use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use tracing::info;

use crate::analysis::pipeline::AnalysisReport;
use crate::analysis::salary::SalaryDataStatus;
use crate::errors::AppError;

/// Where a report landed in object storage.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedReport {
    pub report_key: String,
    pub summary_key: String,
}

/// Publishes analysis reports to the bucket read by the reporting side.
#[derive(Clone)]
pub struct ReportExporter {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl ReportExporter {
    pub fn new(s3: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }

    /// Uploads the JSON report and its markdown summary under `analysis/{run_id}/`.
    pub async fn export(&self, report: &AnalysisReport) -> Result<ExportedReport, AppError> {
        let prefix = format!("analysis/{}", report.run_id);
        let report_key = format!("{prefix}/report.json");
        let summary_key = format!("{prefix}/summary.md");

        let json = serde_json::to_vec_pretty(report)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("report serialization: {e}")))?;
        self.put(&report_key, json, "application/json").await?;
        self.put(
            &summary_key,
            render_report_to_md(report).into_bytes(),
            "text/markdown",
        )
        .await?;

        info!(
            "Uploaded analysis run {} to s3://{}/{}",
            report.run_id, self.bucket, prefix
        );
        Ok(ExportedReport {
            report_key,
            summary_key,
        })
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;
        Ok(())
    }
}

/// Renders the human-readable part of a report as markdown.
pub fn render_report_to_md(report: &AnalysisReport) -> String {
    let mut md = format!("# Skill Cluster Analysis: Run {}\n\n", report.run_id);
    md.push_str(&format!(
        "- **Created:** {}\n- **Jobs:** {}\n- **Vocabulary:** {} terms\n- **k:** {}\n- **df bounds:** [{}, {}]\n\n",
        report.created_at.to_rfc3339(),
        report.job_count,
        report.vocabulary_size,
        report.params.k,
        report.params.df_bounds.min_df,
        report.params.df_bounds.max_df,
    ));

    md.push_str("## Clusters\n\n");
    for cluster in &report.clusters {
        let terms: Vec<&str> = cluster.top_terms.iter().map(|t| t.term.as_str()).collect();
        let signature = if terms.is_empty() {
            "_empty_".to_string()
        } else {
            terms.join(", ")
        };
        md.push_str(&format!(
            "- **Cluster {}** ({} jobs): {}\n",
            cluster.cluster_id, cluster.size, signature
        ));
    }

    md.push_str("\n## Salary by Cluster (sorted by median)\n\n");
    md.push_str("| Cluster | Count | Mean | Median | Std |\n|---|---|---|---|---|\n");
    for stats in &report.salary_stats {
        match stats.status {
            SalaryDataStatus::Available => md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                stats.cluster_id,
                stats.count,
                fmt_amount(stats.mean),
                fmt_amount(stats.median),
                fmt_amount(stats.std_dev),
            )),
            SalaryDataStatus::NoData => {
                md.push_str(&format!("| {} | 0 | no data | | |\n", stats.cluster_id))
            }
        }
    }
    md.push_str(&format!(
        "\n{} jobs without a full salary range, {} outliers removed.\n",
        report.jobs_missing_salary, report.salary_outliers_removed
    ));

    md.push_str("\n## High-Value Skills\n\n| Skill | Salary Correlation | Demand |\n|---|---|---|\n");
    for score in &report.skill_value {
        md.push_str(&format!(
            "| {} | {:.2} | {:.1}% |\n",
            score.skill,
            score.salary_correlation,
            score.demand * 100.0
        ));
    }
    md
}

fn fmt_amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.0}")).unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::corpus::fixtures::four_jobs;
    use crate::analysis::pipeline::{run_analysis, AnalysisParams};
    use crate::analysis::vectorizer::DfBounds;

    fn report() -> AnalysisReport {
        let params = AnalysisParams {
            df_bounds: DfBounds {
                min_df: 0.0,
                max_df: 1.0,
            },
            k: 3,
            ..AnalysisParams::default()
        };
        let mut records = four_jobs();
        records[3].max_salary = None;
        run_analysis(records, &params).unwrap()
    }

    #[test]
    fn test_markdown_lists_every_cluster_and_skill() {
        let report = report();
        let md = render_report_to_md(&report);
        assert!(md.contains(&report.run_id.to_string()));
        for cluster in &report.clusters {
            assert!(md.contains(&format!("**Cluster {}**", cluster.cluster_id)));
        }
        for score in &report.skill_value {
            assert!(md.contains(&format!("| {} |", score.skill)));
        }
        assert!(md.contains("1 jobs without a full salary range"));
    }

    #[test]
    fn test_fmt_amount() {
        assert_eq!(fmt_amount(Some(1234.56)), "1235");
        assert_eq!(fmt_amount(None), "n/a");
    }
}
