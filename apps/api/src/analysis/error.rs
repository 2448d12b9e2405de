use thiserror::Error;

/// Failures of an analysis run.
///
/// Every variant is fatal to the run. Per-job missing salaries and per-k undefined
/// metrics are not errors: they surface as counters and `None` fields in the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Data access failed for source '{source_label}': {message}")]
    DataAccess {
        source_label: String,
        message: String,
    },

    #[error("No job posting has a non-empty skill list")]
    CorpusEmpty,

    #[error(
        "No skill term has a document frequency within [{min_df}, {max_df}] over {documents} documents"
    )]
    VocabularyEmpty {
        min_df: f64,
        max_df: f64,
        documents: usize,
    },

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown job source '{0}'")]
    UnknownSource(String),

    #[error("K-means fit failed for k={k}: {reason}")]
    ClusteringFailed { k: usize, reason: String },
}

impl PipelineError {
    /// Name of the stage that raised the error, reported alongside the message.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::DataAccess { .. } | PipelineError::UnknownSource(_) => "ingest",
            PipelineError::CorpusEmpty => "corpus",
            PipelineError::VocabularyEmpty { .. } => "vectorize",
            PipelineError::InvalidConfig(_) => "config",
            PipelineError::ClusteringFailed { .. } => "cluster",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineError::CorpusEmpty.stage(), "corpus");
        assert_eq!(
            PipelineError::ClusteringFailed {
                k: 3,
                reason: "boom".into()
            }
            .stage(),
            "cluster"
        );
        assert_eq!(PipelineError::UnknownSource("x".into()).stage(), "ingest");
    }

    #[test]
    fn test_vocabulary_empty_message_names_bounds() {
        let err = PipelineError::VocabularyEmpty {
            min_df: 0.5,
            max_df: 0.6,
            documents: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.5") && msg.contains("0.6") && msg.contains('4'), "{msg}");
    }
}
