//! Dataset loading and validation.
//!
//! A dataset directory holds two JSON files:
//! - `qa_pairs.json`: an array of QA records
//! - `distractors.json`: an array of generic filler passages

use crate::error::ExperimentError;
use crate::qa::{DistractorPool, QaRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// File name of the QA records inside a dataset directory.
pub const QA_PAIRS_FILE: &str = "qa_pairs.json";
/// File name of the distractor pool inside a dataset directory.
pub const DISTRACTORS_FILE: &str = "distractors.json";

/// QA records plus the shared distractor pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name.
    pub name: String,
    /// Questions with their gold documents.
    pub records: Vec<QaRecord>,
    /// Generic distractors shared by every record.
    pub distractors: DistractorPool,
}

impl Dataset {
    /// Create a dataset from parts.
    pub fn new(name: &str, records: Vec<QaRecord>, distractors: DistractorPool) -> Self {
        Self {
            name: name.to_string(),
            records,
            distractors,
        }
    }

    /// Number of QA records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no QA records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&QaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Get a subset of records (for quick testing).
    pub fn take(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            records: self.records.iter().take(n).cloned().collect(),
            distractors: self.distractors.clone(),
        }
    }

    /// Load `qa_pairs.json` and `distractors.json` from a directory.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let records = load_qa_pairs(&dir.join(QA_PAIRS_FILE))?;
        let distractors = load_distractors(&dir.join(DISTRACTORS_FILE))?;
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset");
        Ok(Self::new(name, records, distractors))
    }

    /// Check the dataset can drive an experiment over `positions`.
    ///
    /// A pool too small to fill a context without repeats is only warned
    /// about, because context assembly samples with replacement instead.
    pub fn validate(&self, positions: &[usize], total_docs: usize) -> Result<()> {
        if self.records.is_empty() {
            return Err(invalid("No QA pairs loaded"));
        }
        if self.distractors.is_empty() {
            return Err(invalid("No distractors loaded"));
        }

        let mut seen = HashSet::new();
        for (i, record) in self.records.iter().enumerate() {
            let missing = record.missing_fields();
            if !missing.is_empty() {
                return Err(invalid(&format!(
                    "QA pair {} (id={}) missing: {}",
                    i,
                    record.id,
                    missing.join(", ")
                )));
            }
            if !seen.insert(record.id.as_str()) {
                return Err(invalid(&format!("Duplicate QA id '{}'", record.id)));
            }
            let leaking = record.leaking_distractors();
            if !leaking.is_empty() {
                tracing::warn!(
                    qa_id = %record.id,
                    ?leaking,
                    "hard distractors contain the gold answer"
                );
            }
        }

        if let Some(&bad) = positions.iter().find(|&&p| p == 0 || p > total_docs) {
            return Err(invalid(&format!(
                "Position {} must be 1..{}",
                bad, total_docs
            )));
        }

        let needed = total_docs.saturating_sub(1);
        let max_hard = self
            .records
            .iter()
            .map(|r| r.hard_distractors.len())
            .max()
            .unwrap_or(0);
        if self.distractors.len() + max_hard < needed {
            tracing::warn!(
                needed,
                generic = self.distractors.len(),
                max_hard,
                "distractor pool smaller than context; passages will repeat"
            );
        }

        Ok(())
    }

    /// Save to a directory as `qa_pairs.json` and `distractors.json`.
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create dataset directory: {:?}", dir))?;
        fs::write(
            dir.join(QA_PAIRS_FILE),
            serde_json::to_string_pretty(&self.records)?,
        )?;
        fs::write(
            dir.join(DISTRACTORS_FILE),
            serde_json::to_string_pretty(&self.distractors)?,
        )?;
        Ok(())
    }
}

fn invalid(message: &str) -> anyhow::Error {
    ExperimentError::InvalidDataset(message.to_string()).into()
}

/// Load QA records from a JSON array.
pub fn load_qa_pairs(path: &Path) -> Result<Vec<QaRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read QA pairs file: {:?}", path))?;
    let records: Vec<QaRecord> =
        serde_json::from_str(&content).with_context(|| "Failed to parse QA pairs JSON")?;
    Ok(records)
}

/// Load the generic distractor pool from a JSON array of strings.
pub fn load_distractors(path: &Path) -> Result<DistractorPool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read distractors file: {:?}", path))?;
    let pool: DistractorPool =
        serde_json::from_str(&content).with_context(|| "Failed to parse distractors JSON")?;
    Ok(pool)
}

/// Create a sample dataset for testing.
///
/// Entities are fictional so the model cannot answer from memory.
pub fn create_sample_dataset() -> Dataset {
    let records = vec![
        QaRecord::new(
            "sample_1",
            "What is the capital of Valdoria?",
            "Zentrix",
            "Valdoria is a small republic in the northern highlands. Its capital, Zentrix, hosts the national assembly.",
        )
        .with_hard_distractors([
            "Merovia is a coastal kingdom. Its capital, Northgate, is known for its harbour.",
            "The Republic of Castellan moved its capital to Hillford in 1952.",
        ]),
        QaRecord::new(
            "sample_2",
            "Who is the CEO of Aurelian Dynamics?",
            "Maria Thornberg",
            "Aurelian Dynamics appointed Maria Thornberg as its chief executive officer in 2023.",
        )
        .with_hard_distractors([
            "Helix Systems named Jonas Ekdahl as chief executive officer in 2021.",
            "The CEO of Corvane Industries, Priya Anand, announced record profits.",
        ]),
        QaRecord::new(
            "sample_3",
            "In what year was the Brennmoor Observatory founded?",
            "1887",
            "The Brennmoor Observatory was founded in 1887 by a group of amateur astronomers.",
        )
        .with_hard_distractors([
            "The Castlereach Observatory opened to the public in 1342 after decades of construction.",
        ]),
        QaRecord::new(
            "sample_4",
            "What is the population of Lumenport?",
            "2.4 million",
            "According to the latest census, Lumenport has a population of 2.4 million.",
        ),
    ];

    let distractors = DistractorPool::new([
        "The Earth orbits the Sun once every 365.25 days.",
        "Water boils at 100 degrees Celsius at sea level.",
        "Honey never spoils when stored in a sealed container.",
        "Octopuses have three hearts and blue blood.",
        "The Great Wall is visible from low orbit only under ideal conditions.",
        "Bamboo can grow nearly a metre in a single day.",
        "Lightning strikes the Earth about one hundred times per second.",
        "A group of flamingos is called a flamboyance.",
        "The deepest point in the ocean is the Challenger Deep.",
        "Bananas are botanically classified as berries.",
        "Mount Everest grows a few millimetres every year.",
        "Sound travels faster in water than in air.",
    ]);

    Dataset::new("sample", records, distractors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_dataset() {
        let dataset = create_sample_dataset();
        assert_eq!(dataset.name, "sample");
        assert_eq!(dataset.len(), 4);
        assert!(dataset.validate(&[1, 5, 10], 10).is_ok());

        for record in &dataset.records {
            assert!(record.missing_fields().is_empty());
            assert!(record.leaking_distractors().is_empty());
        }
    }

    #[test]
    fn test_dataset_take_and_get() {
        let dataset = create_sample_dataset();
        let subset = dataset.take(2);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.distractors.len(), dataset.distractors.len());
        assert!(dataset.get("sample_3").is_some());
        assert!(dataset.get("missing").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_positions() {
        let dataset = create_sample_dataset();
        assert!(dataset.validate(&[0], 10).is_err());
        assert!(dataset.validate(&[11], 10).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_fields() {
        let mut dataset = create_sample_dataset();
        dataset.records.push(dataset.records[0].clone());
        let err = dataset.validate(&[1], 5).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));

        let mut dataset = create_sample_dataset();
        dataset.records[1].answer = String::new();
        let err = dataset.validate(&[1], 5).unwrap_err();
        assert!(err.to_string().contains("answer"));
    }

    #[test]
    fn test_validate_rejects_empty_parts() {
        let sample = create_sample_dataset();
        let no_records = Dataset::new("x", Vec::new(), sample.distractors.clone());
        assert!(no_records.validate(&[1], 5).is_err());

        let no_pool = Dataset::new("x", sample.records.clone(), DistractorPool::default());
        assert!(no_pool.validate(&[1], 5).is_err());
    }

    #[test]
    fn test_small_pool_is_not_an_error() {
        let dataset = create_sample_dataset();
        assert!(dataset.validate(&[1, 100], 100).is_ok());
    }

    #[test]
    fn test_save_and_load_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts");

        let original = create_sample_dataset();
        original.save_dir(&path).unwrap();

        let loaded = Dataset::load_dir(&path).unwrap();
        assert_eq!(loaded.name, "facts");
        assert_eq!(loaded.records, original.records);
        assert_eq!(loaded.distractors, original.distractors);
    }

    #[test]
    fn test_load_qa_pairs_without_hard_distractors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(QA_PAIRS_FILE);
        fs::write(
            &path,
            r#"[{"id": "q1", "question": "Q?", "answer": "A", "gold_doc": "G"}]"#,
        )
        .unwrap();

        let records = load_qa_pairs(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].hard_distractors.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_distractors(Path::new("/nonexistent/distractors.json")).is_err());
    }
}
