//! Per-trial records and per-position accuracy summaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one (question, position) trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub qa_id: String,
    pub question: String,
    /// 1-indexed gold position.
    pub position: usize,
    pub response: String,
    pub extracted: String,
    pub correct: bool,
    pub gold_answer: String,
    pub latency_ms: f64,
    /// Set when the trial could not be run; such trials count as incorrect.
    #[serde(default)]
    pub error: Option<String>,
}

/// Accuracy at one gold position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
}

impl PositionSummary {
    fn from_counts(correct: usize, total: usize) -> Self {
        let accuracy = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };
        Self {
            accuracy,
            correct,
            total,
        }
    }
}

/// Run parameters stored alongside results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub positions: Vec<usize>,
    pub total_docs: usize,
    /// Trials actually run per position, after capping by the dataset size.
    pub trials_per_position: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub prompt_style: String,
}

/// Everything one model run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub model_name: String,
    pub model_id: String,
    pub dataset_name: String,
    pub timestamp: String,
    pub config: RunConfig,
    /// Summaries keyed by gold position.
    pub positions: BTreeMap<usize, PositionSummary>,
    pub raw_results: Vec<TrialResult>,
    /// Total run time (seconds).
    pub total_time_secs: f64,
}

impl ExperimentResults {
    /// Create empty results.
    pub fn new(model_name: &str, model_id: &str, dataset_name: &str, config: RunConfig) -> Self {
        Self {
            model_name: model_name.to_string(),
            model_id: model_id.to_string(),
            dataset_name: dataset_name.to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            config,
            positions: BTreeMap::new(),
            raw_results: Vec::new(),
            total_time_secs: 0.0,
        }
    }

    /// Recompute per-position summaries from the raw trial records.
    pub fn calculate_summary(&mut self) {
        let mut counts: BTreeMap<usize, (usize, usize)> = self
            .config
            .positions
            .iter()
            .map(|&p| (p, (0, 0)))
            .collect();

        for trial in &self.raw_results {
            let entry = counts.entry(trial.position).or_insert((0, 0));
            if trial.correct {
                entry.0 += 1;
            }
            entry.1 += 1;
        }

        self.positions = counts
            .into_iter()
            .map(|(p, (correct, total))| (p, PositionSummary::from_counts(correct, total)))
            .collect();
    }

    /// Accuracy over all trials.
    pub fn overall_accuracy(&self) -> f64 {
        let correct = self.raw_results.iter().filter(|t| t.correct).count();
        PositionSummary::from_counts(correct, self.raw_results.len()).accuracy
    }

    /// Number of trials that failed to run.
    pub fn error_count(&self) -> usize {
        self.raw_results.iter().filter(|t| t.error.is_some()).count()
    }

    /// Positions with the highest and lowest accuracy.
    pub fn best_and_worst(&self) -> Option<(usize, usize)> {
        let best = self
            .positions
            .iter()
            .max_by(|a, b| a.1.accuracy.total_cmp(&b.1.accuracy))?;
        let worst = self
            .positions
            .iter()
            .min_by(|a, b| a.1.accuracy.total_cmp(&b.1.accuracy))?;
        Some((*best.0, *worst.0))
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Accuracy by Position ==========");
        println!("Model:   {} ({})", self.model_name, self.model_id);
        println!("Dataset: {}", self.dataset_name);
        println!(
            "Context: {} documents, {} trials per position",
            self.config.total_docs, self.config.trials_per_position
        );
        println!("-------------------------------------------");
        for (position, summary) in &self.positions {
            println!(
                "Pos {:>4}: {:>5.1}% ({}/{})",
                position,
                summary.accuracy * 100.0,
                summary.correct,
                summary.total
            );
        }
        println!("-------------------------------------------");
        println!("Overall: {:.1}%", self.overall_accuracy() * 100.0);
        if let Some((best, worst)) = self.best_and_worst() {
            println!("Best position: {}  Worst position: {}", best, worst);
        }
        let errors = self.error_count();
        if errors > 0 {
            println!("Errored trials: {}", errors);
        }
        println!("Total time: {:.1}s", self.total_time_secs);
        println!("===========================================\n");
    }
}
