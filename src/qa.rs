//! Question/answer records and the generic distractor pool.
//!
//! Both are loaded once at experiment start and only ever read afterwards.

use serde::{Deserialize, Serialize};

/// One testable fact: a question, its gold answer and the passage stating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    /// Unique identifier.
    pub id: String,
    /// Natural-language question.
    pub question: String,
    /// Canonical gold answer.
    pub answer: String,
    /// Passage that states the answer. Inserted verbatim into contexts.
    pub gold_doc: String,
    /// Passages about similar but wrong entities of the same category.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hard_distractors: Vec<String>,
    /// Alternative phrasings also accepted as correct.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer_variants: Vec<String>,
}

impl QaRecord {
    /// Create a record without hard distractors.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        gold_doc: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            gold_doc: gold_doc.into(),
            hard_distractors: Vec::new(),
            answer_variants: Vec::new(),
        }
    }

    /// Attach hard distractors.
    pub fn with_hard_distractors<I, S>(mut self, distractors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hard_distractors = distractors.into_iter().map(Into::into).collect();
        self
    }

    /// Attach accepted alternative answers.
    pub fn with_answer_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answer_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.id.trim().is_empty() {
            missing.push("id");
        }
        if self.question.trim().is_empty() {
            missing.push("question");
        }
        if self.answer.trim().is_empty() {
            missing.push("answer");
        }
        if self.gold_doc.trim().is_empty() {
            missing.push("gold_doc");
        }
        missing
    }

    /// Hard distractors that contain the literal gold answer.
    ///
    /// These make a trial unanswerable by position alone, so datasets are
    /// expected to have none.
    pub fn leaking_distractors(&self) -> Vec<usize> {
        if self.answer.trim().is_empty() {
            return Vec::new();
        }
        let needle = self.answer.to_lowercase();
        self.hard_distractors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Unrelated filler passages, shuffled per call and reused across trials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistractorPool {
    passages: Vec<String>,
}

impl DistractorPool {
    /// Create a pool from passages.
    pub fn new<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passages: passages.into_iter().map(Into::into).collect(),
        }
    }

    /// The passages in load order.
    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl From<Vec<String>> for DistractorPool {
    fn from(passages: Vec<String>) -> Self {
        Self { passages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_distractors_default_to_empty() {
        let json = r#"{"id":"q1","question":"Q?","answer":"A","gold_doc":"G"}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();
        assert!(record.hard_distractors.is_empty());
        assert!(record.answer_variants.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let record = QaRecord::new("q1", "", "A", " ");
        assert_eq!(record.missing_fields(), vec!["question", "gold_doc"]);
    }

    #[test]
    fn test_leaking_distractors() {
        let record = QaRecord::new("q1", "Who?", "Zentrix", "Zentrix is the capital.")
            .with_hard_distractors(["Northgate is a city.", "ZENTRIX is mentioned here."]);
        assert_eq!(record.leaking_distractors(), vec![1]);
    }

    #[test]
    fn test_pool_is_transparent_json() {
        let pool: DistractorPool = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.passages()[1], "b");
    }
}
