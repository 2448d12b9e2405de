use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::error::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<&'static str>) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Pipeline(e) => {
                let (status, code) = match e {
                    PipelineError::DataAccess { .. } => {
                        tracing::error!("Data access error: {e}");
                        (StatusCode::INTERNAL_SERVER_ERROR, "DATA_ACCESS_ERROR")
                    }
                    PipelineError::CorpusEmpty => (StatusCode::UNPROCESSABLE_ENTITY, "CORPUS_EMPTY"),
                    PipelineError::VocabularyEmpty { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "VOCABULARY_EMPTY")
                    }
                    PipelineError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "INVALID_CONFIG"),
                    PipelineError::UnknownSource(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_SOURCE"),
                    PipelineError::ClusteringFailed { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "CLUSTERING_FAILED")
                    }
                };
                (status, code, e.to_string(), Some(e.stage()))
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                    Some("export"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "stage": stage,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_failures_are_client_errors() {
        let (status, code, _, stage) = AppError::from(PipelineError::CorpusEmpty).parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "CORPUS_EMPTY");
        assert_eq!(stage, Some("corpus"));

        let (status, code, message, _) =
            AppError::from(PipelineError::UnknownSource("monster".into())).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "UNKNOWN_SOURCE");
        assert!(message.contains("monster"));
    }

    #[test]
    fn test_infrastructure_failures_are_server_errors() {
        let err = AppError::from(PipelineError::DataAccess {
            source_label: "no_fluff_jobs".into(),
            message: "timeout".into(),
        });
        let (status, code, message, stage) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "DATA_ACCESS_ERROR");
        assert!(message.contains("no_fluff_jobs"));
        assert_eq!(stage, Some("ingest"));

        let (status, _, message, _) = AppError::Internal(anyhow::anyhow!("secret")).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret"));
    }
}
