//! Reordering retrieved documents around a model's positional bias.
//!
//! Small models tend to attend unevenly across a long context, some
//! favouring the end, some both edges. These strategies put the highest
//! scoring documents where the target model looks.

use crate::error::{ExperimentError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A retrieved document with a relevance score (higher is more relevant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub text: String,
    #[serde(default)]
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderStrategy {
    /// Ascending score, best document last. For recency-biased models.
    #[default]
    BestLast,
    /// Best documents alternate between the start and the end.
    SidesFirst,
    /// Descending score, the usual retrieval order.
    BestFirst,
}

impl ReorderStrategy {
    /// Strategy for a model name. Unrecognized names get [`BestLast`].
    ///
    /// [`BestLast`]: ReorderStrategy::BestLast
    pub fn for_model(model: &str) -> Self {
        let model = model.to_lowercase();
        if model.contains("llama") {
            ReorderStrategy::BestFirst
        } else {
            // Gemma 2B and 4B both score best with the gold document last.
            ReorderStrategy::BestLast
        }
    }

    /// Reorder documents. The input is left untouched.
    pub fn apply(&self, documents: &[ScoredDocument]) -> Vec<ScoredDocument> {
        match self {
            ReorderStrategy::BestLast => {
                let mut docs = documents.to_vec();
                docs.sort_by(|a, b| by_score(a, b));
                docs
            }
            ReorderStrategy::BestFirst => {
                let mut docs = documents.to_vec();
                docs.sort_by(|a, b| by_score(b, a));
                docs
            }
            ReorderStrategy::SidesFirst => sides_first(documents),
        }
    }
}

fn by_score(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal)
}

fn sides_first(documents: &[ScoredDocument]) -> Vec<ScoredDocument> {
    if documents.len() <= 2 {
        return documents.to_vec();
    }

    let mut ranked = documents.to_vec();
    ranked.sort_by(|a, b| by_score(b, a));

    let mut front = Vec::with_capacity(ranked.len());
    let mut back = Vec::with_capacity(ranked.len() / 2);
    for (i, doc) in ranked.into_iter().enumerate() {
        if i % 2 == 0 {
            front.push(doc);
        } else {
            back.push(doc);
        }
    }
    back.reverse();
    front.extend(back);
    front
}

impl FromStr for ReorderStrategy {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "best-last" => Ok(ReorderStrategy::BestLast),
            "sides-first" => Ok(ReorderStrategy::SidesFirst),
            "best-first" => Ok(ReorderStrategy::BestFirst),
            other => Err(ExperimentError::Config(format!(
                "Unknown reorder strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReorderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReorderStrategy::BestLast => "best-last",
            ReorderStrategy::SidesFirst => "sides-first",
            ReorderStrategy::BestFirst => "best-first",
        };
        f.write_str(name)
    }
}

/// Move the document at 0-indexed `from` to 0-indexed `to`.
pub fn move_to_position<T: Clone>(documents: &[T], from: usize, to: usize) -> Result<Vec<T>> {
    let len = documents.len();
    if from >= len || to >= len {
        return Err(ExperimentError::InvalidPlacement {
            gold_position: to + 1,
            total_docs: len,
        });
    }
    let mut docs = documents.to_vec();
    let doc = docs.remove(from);
    docs.insert(to, doc);
    Ok(docs)
}
