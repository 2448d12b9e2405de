//! Skill Vectorizer: document-frequency-bounded TF-IDF over the skill corpus.
//!
//! Tokens are runs of two or more word characters. Columns follow the lexicographic
//! order of the retained terms. Weights use raw term counts, smoothed idf
//! `ln((1 + n) / (1 + df)) + 1`, and each job vector is L2-normalized.

use std::collections::HashMap;

use ndarray::Array2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::corpus::SkillCorpus;
use crate::analysis::error::PipelineError;

const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Fractional document-frequency bounds for vocabulary membership.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DfBounds {
    pub min_df: f64,
    pub max_df: f64,
}

impl Default for DfBounds {
    fn default() -> Self {
        Self {
            min_df: 0.015,
            max_df: 0.99,
        }
    }
}

impl DfBounds {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.min_df) || !in_unit(self.max_df) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_df and max_df must lie in [0, 1] (got {}, {})",
                self.min_df, self.max_df
            )));
        }
        if self.min_df > self.max_df {
            return Err(PipelineError::InvalidConfig(format!(
                "min_df ({}) must not exceed max_df ({})",
                self.min_df, self.max_df
            )));
        }
        Ok(())
    }

    fn admits(&self, df: usize, documents: usize) -> bool {
        let df = df as f64;
        let n = documents as f64;
        df >= self.min_df * n && df <= self.max_df * n
    }
}

/// Vocabulary and job vectors derived from one corpus snapshot.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    terms: Vec<String>,
    document_frequency: Vec<usize>,
    idf: Vec<f64>,
    matrix: Array2<f64>,
}

impl VectorSpace {
    /// Terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn document_frequency(&self) -> &[usize] {
        &self.document_frequency
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// One row per job, one column per term.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    /// Vocabulary rows for reporting, in column order.
    pub fn vocabulary(&self) -> Vec<VocabularyTerm> {
        self.terms
            .iter()
            .zip(&self.document_frequency)
            .zip(&self.idf)
            .map(|((term, &document_frequency), &idf)| VocabularyTerm {
                term: term.clone(),
                document_frequency,
                idf,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub term: String,
    pub document_frequency: usize,
    pub idf: f64,
}

pub struct SkillVectorizer {
    bounds: DfBounds,
    token_pattern: Regex,
}

impl SkillVectorizer {
    pub fn new(bounds: DfBounds) -> Result<Self, PipelineError> {
        bounds.validate()?;
        let token_pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| PipelineError::InvalidConfig(format!("token pattern: {e}")))?;
        Ok(Self {
            bounds,
            token_pattern,
        })
    }

    /// Builds the bounded vocabulary and the TF-IDF matrix for `corpus`.
    pub fn fit_transform(&self, corpus: &SkillCorpus) -> Result<VectorSpace, PipelineError> {
        let documents = corpus.len();

        let counts: Vec<HashMap<&str, usize>> = corpus
            .texts()
            .iter()
            .map(|text| {
                let mut tf: HashMap<&str, usize> = HashMap::new();
                for token in self.token_pattern.find_iter(text) {
                    *tf.entry(token.as_str()).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for tf in &counts {
            for term in tf.keys() {
                *df.entry(*term).or_insert(0) += 1;
            }
        }

        let mut vocabulary: Vec<(&str, usize)> = df
            .into_iter()
            .filter(|(_, freq)| self.bounds.admits(*freq, documents))
            .collect();
        vocabulary.sort_unstable_by(|a, b| a.0.cmp(b.0));

        if vocabulary.is_empty() {
            return Err(PipelineError::VocabularyEmpty {
                min_df: self.bounds.min_df,
                max_df: self.bounds.max_df,
                documents,
            });
        }

        let columns: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(col, (term, _))| (*term, col))
            .collect();
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|(_, freq)| ((1.0 + documents as f64) / (1.0 + *freq as f64)).ln() + 1.0)
            .collect();

        let mut matrix = Array2::<f64>::zeros((documents, vocabulary.len()));
        for (row, tf) in counts.iter().enumerate() {
            for (term, count) in tf {
                if let Some(&col) = columns.get(term) {
                    matrix[[row, col]] = *count as f64 * idf[col];
                }
            }
            let mut job_vector = matrix.row_mut(row);
            let norm = job_vector.dot(&job_vector).sqrt();
            if norm > 0.0 {
                job_vector.mapv_inplace(|w| w / norm);
            }
        }

        info!(
            "Skill matrix shape: ({}, {}) with df bounds [{}, {}]",
            documents,
            vocabulary.len(),
            self.bounds.min_df,
            self.bounds.max_df
        );

        Ok(VectorSpace {
            terms: vocabulary.iter().map(|(t, _)| t.to_string()).collect(),
            document_frequency: vocabulary.iter().map(|(_, f)| *f).collect(),
            idf,
            matrix,
        })
    }
}
