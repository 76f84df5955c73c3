//! Persistence layer for saving/loading experiment results.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.

use crate::error::{ExperimentError, Result};
use crate::experiment::ExperimentResults;
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory for result files.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Save format for result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Default output path: `results/results_<model>_<YYYYMMDD_HHMMSS>.json`.
pub fn default_results_path(model_name: &str) -> PathBuf {
    let safe_name: String = model_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Path::new(DEFAULT_RESULTS_DIR).join(format!("results_{}_{}.json", safe_name, stamp))
}

/// Save experiment results to a file.
pub fn save_results(results: &ExperimentResults, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path);
    save_results_with_format(results, path, format)
}

/// Save experiment results with a specific format.
pub fn save_results_with_format(
    results: &ExperimentResults,
    path: &Path,
    format: SaveFormat,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ExperimentError::io(parent, e))?;
        }
    }

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(results)
            .map_err(|e| ExperimentError::Serialization(e.to_string()))?
            .into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::serde::encode_to_vec(results, config)
                .map_err(|e| ExperimentError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| ExperimentError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "results saved");

    Ok(())
}

/// Load experiment results from a file.
pub fn load_results(path: &Path) -> Result<ExperimentResults> {
    if !path.exists() {
        return Err(ExperimentError::ResultsNotFound(path.to_path_buf()));
    }

    let format = SaveFormat::from_path(path);
    load_results_with_format(path, format)
}

/// Load experiment results with a specific format.
pub fn load_results_with_format(path: &Path, format: SaveFormat) -> Result<ExperimentResults> {
    let data = fs::read(path).map_err(|e| ExperimentError::io(path, e))?;

    let results = match format {
        SaveFormat::Json => serde_json::from_slice(&data)
            .map_err(|e| ExperimentError::Serialization(e.to_string()))?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (results, _): (ExperimentResults, usize) =
                bincode::serde::decode_from_slice(&data, config)
                    .map_err(|e| ExperimentError::Serialization(e.to_string()))?;
            results
        }
    };

    Ok(results)
}

/// Check if a results file exists at the given path.
pub fn results_exist(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Get the size of a results file in bytes.
pub fn results_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| ExperimentError::io(path, e))?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{RunConfig, TrialResult};
    use tempfile::TempDir;

    fn create_test_results() -> ExperimentResults {
        let config = RunConfig {
            positions: vec![1, 10],
            total_docs: 10,
            trials_per_position: 1,
            max_new_tokens: 50,
            temperature: 0.0,
            prompt_style: "standard".to_string(),
        };
        let mut results = ExperimentResults::new("gemma-2b", "gemma-2-2b-it", "sample", config);
        for (position, correct) in [(1, true), (10, false)] {
            results.raw_results.push(TrialResult {
                qa_id: "sample_1".to_string(),
                question: "What is the capital of Valdoria?".to_string(),
                position,
                response: if correct { "Zentrix" } else { "Northgate" }.to_string(),
                extracted: if correct { "Zentrix" } else { "Northgate" }.to_string(),
                correct,
                gold_answer: "Zentrix".to_string(),
                latency_ms: 120.5,
                error: None,
            });
        }
        results.total_time_secs = 1.5;
        results.calculate_summary();
        results
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let original = create_test_results();
        save_results(&original, &path).unwrap();

        assert!(results_exist(&path));

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.model_name, original.model_name);
        assert_eq!(loaded.positions, original.positions);
        assert_eq!(loaded.raw_results, original.raw_results);
    }

    #[test]
    fn test_save_and_load_bincode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.bin");

        let original = create_test_results();
        save_results(&original, &path).unwrap();

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.timestamp, original.timestamp);
        assert_eq!(loaded.config, original.config);
        assert_eq!(loaded.raw_results, original.raw_results);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("results.json");

        save_results(&create_test_results(), &path).unwrap();
        assert!(results_exist(&path));
        assert!(results_size(&path).unwrap() > 0);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SaveFormat::from_path(Path::new("test.json")),
            SaveFormat::Json
        );
        assert_eq!(
            SaveFormat::from_path(Path::new("test.bin")),
            SaveFormat::Bincode
        );
        assert_eq!(
            SaveFormat::from_path(Path::new("test.bincode")),
            SaveFormat::Bincode
        );
        assert_eq!(SaveFormat::from_path(Path::new("test")), SaveFormat::Json);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_results(Path::new("/nonexistent/results.json"));
        assert!(matches!(result, Err(ExperimentError::ResultsNotFound(_))));
    }

    #[test]
    fn test_json_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        save_results(&create_test_results(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("gemma-2-2b-it"));
        assert!(content.contains("\"positions\""));
    }

    #[test]
    fn test_default_results_path() {
        let path = default_results_path("org/model v1");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(path.starts_with(DEFAULT_RESULTS_DIR));
        assert!(name.starts_with("results_org_model_v1_"));
        assert!(name.ends_with(".json"));
    }
}
