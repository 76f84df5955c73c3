//! Experiment runner: one model, every (position, question) pair.

use super::dataset::Dataset;
use super::results::{ExperimentResults, RunConfig, TrialResult};
use crate::config::Config;
use crate::context::PlacementRequest;
use crate::evaluator::evaluate_with_variants;
use crate::llm::{ModelRunner, PromptStyle};
use crate::qa::{DistractorPool, QaRecord};
use anyhow::Result;
use std::io::Write;
use std::time::Instant;

/// Settings for one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentSettings {
    /// 1-indexed gold positions to test.
    pub positions: Vec<usize>,
    /// Documents per context.
    pub total_docs: usize,
    /// Questions per position.
    pub trials_per_position: usize,
    /// Optional further cap on questions per position.
    pub limit: Option<usize>,
    /// Prompt layout.
    pub prompt_style: PromptStyle,
    /// Recorded with results; the runner owns generation settings.
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Verbose output.
    pub verbose: bool,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ExperimentSettings {
    /// Settings taken from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            positions: config.experiment.positions.clone(),
            total_docs: config.experiment.total_docs,
            trials_per_position: config.experiment.trials_per_position,
            limit: None,
            prompt_style: config.experiment.prompt_style,
            max_new_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            verbose: false,
        }
    }

    /// Questions actually run per position for a dataset of `available` records.
    pub fn effective_trials(&self, available: usize) -> usize {
        let trials = self.trials_per_position.min(available);
        match self.limit {
            Some(limit) => trials.min(limit),
            None => trials,
        }
    }
}

/// Experiment runner.
pub struct Experiment {
    settings: ExperimentSettings,
}

impl Experiment {
    /// Create a new experiment runner.
    pub fn new(settings: ExperimentSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    /// Build the prompt for one record at one position.
    pub fn prompt_for(
        &self,
        qa: &QaRecord,
        pool: &DistractorPool,
        position: usize,
    ) -> crate::error::Result<String> {
        let context =
            PlacementRequest::derived(qa, position, self.settings.total_docs).build(pool)?;
        Ok(self.settings.prompt_style.render(&context.render(), &qa.question))
    }

    /// Run every configured position against the dataset.
    pub async fn run<R: ModelRunner>(&self, runner: &R, dataset: &Dataset) -> Result<ExperimentResults> {
        let start_time = Instant::now();
        dataset.validate(&self.settings.positions, self.settings.total_docs)?;

        let trials = self.settings.effective_trials(dataset.len());
        if trials < self.settings.trials_per_position {
            tracing::warn!(
                requested = self.settings.trials_per_position,
                trials,
                "capping trials per position"
            );
        }

        let run_config = RunConfig {
            positions: self.settings.positions.clone(),
            total_docs: self.settings.total_docs,
            trials_per_position: trials,
            max_new_tokens: self.settings.max_new_tokens,
            temperature: self.settings.temperature,
            prompt_style: self.settings.prompt_style.to_string(),
        };
        let mut results =
            ExperimentResults::new(runner.name(), runner.id(), &dataset.name, run_config);

        for &position in &self.settings.positions {
            println!(
                "\n--- Position {}/{} ---",
                position, self.settings.total_docs
            );

            let mut correct = 0;
            for (idx, qa) in dataset.records.iter().take(trials).enumerate() {
                let trial = self.run_trial(runner, qa, &dataset.distractors, position).await;

                if self.settings.verbose {
                    let status = if trial.correct { "✓" } else { "✗" };
                    println!("\n[{}/{}] {} Q: {}", idx + 1, trials, status, qa.question);
                    println!("   Expected: {}", qa.answer);
                    println!("   Got: {}", preview(&trial.response, 100));
                    if !trial.correct {
                        println!("   Extracted: {}", trial.extracted);
                    }
                    if let Some(err) = &trial.error {
                        eprintln!("   Error: {}", err);
                    }
                } else {
                    print!("{}", if trial.correct { "." } else { "x" });
                    std::io::stdout().flush().ok();
                }

                if trial.correct {
                    correct += 1;
                }
                results.raw_results.push(trial);
            }

            if !self.settings.verbose {
                println!(); // Newline after dots
            }

            let accuracy = if trials > 0 {
                correct as f64 / trials as f64
            } else {
                0.0
            };
            tracing::info!(position, correct, trials, accuracy, "position complete");
            println!(
                "Position {}: {}/{} = {:.1}%",
                position,
                correct,
                trials,
                accuracy * 100.0
            );
        }

        results.total_time_secs = start_time.elapsed().as_secs_f64();
        results.calculate_summary();

        Ok(results)
    }

    /// Run a single trial. Failures are recorded on the trial, not returned.
    async fn run_trial<R: ModelRunner>(
        &self,
        runner: &R,
        qa: &QaRecord,
        pool: &DistractorPool,
        position: usize,
    ) -> TrialResult {
        let mut trial = TrialResult {
            qa_id: qa.id.clone(),
            question: qa.question.clone(),
            position,
            response: String::new(),
            extracted: String::new(),
            correct: false,
            gold_answer: qa.answer.clone(),
            latency_ms: 0.0,
            error: None,
        };

        let prompt = match self.prompt_for(qa, pool, position) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(qa_id = %qa.id, position, error = %e, "context assembly failed");
                trial.error = Some(format!("Context error: {}", e));
                return trial;
            }
        };

        match runner.generate(&prompt).await {
            Ok(generation) => {
                let verdict =
                    evaluate_with_variants(&generation.text, &qa.answer, &qa.answer_variants);
                tracing::debug!(
                    qa_id = %qa.id,
                    position,
                    correct = verdict.is_correct,
                    reason = ?verdict.reason,
                    "trial evaluated"
                );
                trial.response = generation.text;
                trial.latency_ms = generation.latency_ms;
                trial.extracted = verdict.extracted;
                trial.correct = verdict.is_correct;
            }
            Err(e) => {
                tracing::error!(qa_id = %qa.id, position, error = %e, "generation failed");
                trial.error = Some(format!("Generation error: {}", e));
            }
        }

        trial
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::dataset::create_sample_dataset;
    use crate::llm::DryRunRunner;

    fn settings() -> ExperimentSettings {
        ExperimentSettings {
            positions: vec![1, 5, 10],
            total_docs: 10,
            trials_per_position: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_trials() {
        let mut s = settings();
        assert_eq!(s.effective_trials(10), 3);
        assert_eq!(s.effective_trials(2), 2);
        s.limit = Some(1);
        assert_eq!(s.effective_trials(10), 1);
    }

    #[test]
    fn test_default_settings_follow_config() {
        let s = ExperimentSettings::default();
        assert_eq!(s.total_docs, 100);
        assert_eq!(s.trials_per_position, 30);
        assert_eq!(s.max_new_tokens, 50);
        assert!(s.limit.is_none());
    }

    #[test]
    fn test_prompt_for_places_gold() {
        let dataset = create_sample_dataset();
        let experiment = Experiment::new(settings());
        let qa = &dataset.records[0];

        let prompt = experiment.prompt_for(qa, &dataset.distractors, 5).unwrap();
        assert!(prompt.contains(&format!("Document 5: {}", qa.gold_doc)));
        assert!(prompt.contains("Document 10: "));
        assert!(prompt.ends_with("Answer:"));

        let again = experiment.prompt_for(qa, &dataset.distractors, 5).unwrap();
        assert_eq!(prompt, again);
    }

    #[test]
    fn test_dry_run_records_every_trial() {
        let dataset = create_sample_dataset();
        let experiment = Experiment::new(settings());
        let runner = DryRunRunner::new("dry");

        let results = tokio_test::block_on(experiment.run(&runner, &dataset)).unwrap();
        assert_eq!(results.raw_results.len(), 9);
        assert_eq!(results.config.trials_per_position, 3);
        assert_eq!(results.positions.len(), 3);
        assert!(results.raw_results.iter().all(|t| !t.correct));
        assert_eq!(results.error_count(), 0);
        assert_eq!(results.model_name, "dry");
        assert_eq!(results.model_id, crate::llm::DRY_RUN_MODEL_ID);
    }

    #[test]
    fn test_run_rejects_invalid_positions() {
        let dataset = create_sample_dataset();
        let experiment = Experiment::new(ExperimentSettings {
            positions: vec![11],
            ..settings()
        });
        let runner = DryRunRunner::new("dry");
        assert!(tokio_test::block_on(experiment.run(&runner, &dataset)).is_err());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
