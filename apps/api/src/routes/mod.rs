pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::jobs::handlers as skills;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analysis/runs", post(analysis::handle_run))
        .route("/api/v1/analysis/adhoc", post(analysis::handle_adhoc))
        .route("/api/v1/analysis/k-sweep", post(analysis::handle_k_sweep))
        // Skill frequency API
        .route("/api/v1/skills/frequency", get(skills::handle_skill_frequency))
        .route("/api/v1/skills/top", get(skills::handle_top_skills))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::export::ReportExporter;
    use crate::config::test_config;
    use crate::jobs::store::testing::{row, StaticJobSource};
    use crate::models::job::Source;

    fn offline_s3() -> aws_sdk_s3::Client {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        aws_sdk_s3::Client::from_conf(conf)
    }

    fn app(store: StaticJobSource) -> Router {
        let config = test_config();
        build_router(AppState {
            jobs: Arc::new(store),
            exporter: ReportExporter::new(offline_s3(), config.s3_bucket.clone()),
            config,
        })
    }

    fn seeded_store() -> StaticJobSource {
        let mut store = StaticJobSource::default();
        store.rows.insert(
            Source::NoFluffJobs,
            vec![
                row("Data Engineer", &["Python", "SQL"], Some((10_000.0, 14_000.0))),
                row("Backend Developer", &["Python", "Java"], Some((11_000.0, 15_000.0))),
            ],
        );
        store.rows.insert(
            Source::JustJoinIt,
            vec![
                row("Backend Developer", &["Java", "Docker"], Some((20_000.0, 26_000.0))),
                row("DevOps Engineer", &["Docker", "Kubernetes"], None),
            ],
        );
        store
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(StaticJobSource::default()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_run_over_both_sources() {
        let request = post_json(
            "/api/v1/analysis/runs",
            json!({ "params": { "min_df": 0.0, "max_df": 1.0, "k": 2 } }),
        );
        let (status, body) = send(app(seeded_store()), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["ingest"]["loaded"], 4);
        assert_eq!(body["report"]["job_count"], 4);
        assert_eq!(body["report"]["vocabulary_size"], 5);
        assert_eq!(body["report"]["assignments"].as_array().unwrap().len(), 4);
        assert_eq!(body["report"]["jobs_missing_salary"], 1);
        assert!(body["export"].is_null());
    }

    #[tokio::test]
    async fn test_vocabulary_empty_is_unprocessable() {
        let request = post_json(
            "/api/v1/analysis/runs",
            json!({ "params": { "min_df": 0.9, "max_df": 1.0, "k": 2 } }),
        );
        let (status, body) = send(app(seeded_store()), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VOCABULARY_EMPTY");
        assert_eq!(body["error"]["stage"], "vectorize");
    }

    #[tokio::test]
    async fn test_data_access_failure_is_server_error() {
        let store = StaticJobSource {
            failing: vec![Source::NoFluffJobs],
            ..seeded_store()
        };
        let (status, body) = send(
            app(store),
            post_json("/api/v1/analysis/runs", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATA_ACCESS_ERROR");
    }

    #[tokio::test]
    async fn test_adhoc_run_quarantines_bad_rows() {
        let request = post_json(
            "/api/v1/analysis/adhoc",
            json!({
                "source": "just_join_it",
                "params": { "min_df": 0.0, "max_df": 1.0, "k": 1 },
                "jobs": [
                    { "job_title": "Dev", "company_name": "Acme", "must_have_skills": ["Rust", "SQL"] },
                    { "job_title": "Dev", "company_name": "Acme", "must_have_skills": ["Rust"] },
                    { "company_name": "Acme", "must_have_skills": ["Go"] }
                ]
            }),
        );
        let (status, body) = send(app(StaticJobSource::default()), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["ingest"]["loaded"], 2);
        assert_eq!(body["ingest"]["quarantined"], 1);
        assert_eq!(body["report"]["clusters"][0]["size"], 2);
        assert_eq!(body["report"]["salary_stats"][0]["status"], "no_data");
    }

    #[tokio::test]
    async fn test_adhoc_without_usable_jobs_is_corpus_empty() {
        let request = post_json(
            "/api/v1/analysis/adhoc",
            json!({
                "source": "no_fluff_jobs",
                "jobs": [ { "job_title": "Dev", "company_name": "Acme", "must_have_skills": [] } ]
            }),
        );
        let (status, body) = send(app(StaticJobSource::default()), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "CORPUS_EMPTY");
    }

    #[tokio::test]
    async fn test_k_sweep_reports_each_k() {
        let request = post_json(
            "/api/v1/analysis/k-sweep",
            json!({ "min_df": 0.0, "max_df": 1.0, "k_min": 1, "k_max": 3 }),
        );
        let (status, body) = send(app(seeded_store()), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let metrics = body["sweep"]["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 3);
        assert!(metrics["1"]["silhouette"].is_null());
        assert!(metrics["2"]["silhouette"].is_number());
    }

    #[tokio::test]
    async fn test_skill_frequency_merges_sources() {
        let (status, body) = send(app(seeded_store()), get("/api/v1/skills/frequency")).await;
        assert_eq!(status, StatusCode::OK);
        let skills = body["skills"].as_array().unwrap();
        let java = skills.iter().find(|s| s["skill"] == "Java").unwrap();
        assert_eq!(java["job_count"], 2);
        assert_eq!(java["unique_titles_count"], 1);
        assert_eq!(java["avg_min_salary"], 15_500.0);
    }

    #[tokio::test]
    async fn test_unknown_source_is_bad_request() {
        let (status, body) = send(
            app(seeded_store()),
            get("/api/v1/skills/frequency?sources=no_fluff_jobs,monster"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNKNOWN_SOURCE");
    }

    #[tokio::test]
    async fn test_top_skills_for_one_source() {
        let (status, body) = send(
            app(seeded_store()),
            get("/api/v1/skills/top?source=no_fluff_jobs&limit=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"][0]["skill"], "python");
        assert_eq!(body["skills"][0]["count"], 2);
        assert_eq!(body["skills"].as_array().unwrap().len(), 1);
    }
}
