//! Error types for context assembly, configuration and model access.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors that can occur while building contexts or running an experiment.
#[derive(Error, Debug)]
pub enum ExperimentError {
    /// Gold position outside `1..=total_docs`, or `total_docs` of zero.
    #[error("Invalid placement: gold position {gold_position} with {total_docs} total documents")]
    InvalidPlacement {
        gold_position: usize,
        total_docs: usize,
    },

    /// Distractors are required but there is nothing to draw them from.
    #[error("Need {needed} distractors but both the hard list and the generic pool are empty")]
    NoDistractors { needed: usize },

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The results file does not exist.
    #[error("Results file not found at '{0}'")]
    ResultsNotFound(PathBuf),

    /// Dataset failed validation.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl ExperimentError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ExperimentError {
    fn from(err: reqwest::Error) -> Self {
        ExperimentError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ExperimentError {
    fn from(err: serde_json::Error) -> Self {
        ExperimentError::LlmParse(err.to_string())
    }
}
