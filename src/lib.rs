//! Lost in the Middle - measures how answer accuracy depends on where the
//! relevant passage sits in a long multi-document context.
//!
//! Each trial places a question's gold passage at a chosen position among
//! distractor passages, asks a model the question, and checks the answer
//! against the gold answer.
//!
//! # Quick Start
//!
//! ```no_run
//! use lost_in_middle::{
//!     config::Config,
//!     experiment::{Dataset, Experiment, ExperimentSettings},
//!     llm::LlmRunner,
//!     persistence::save_results,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     // Load QA pairs and distractors
//!     let dataset = Dataset::load_dir(Path::new("data/nq"))?;
//!
//!     // Run every configured position
//!     let runner = LlmRunner::from_config(config.llm.clone());
//!     let experiment = Experiment::new(ExperimentSettings::from_config(&config));
//!     let results = experiment.run(&runner, &dataset).await?;
//!
//!     results.print_summary();
//!     save_results(&results, Path::new("results/run.json"))?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **context**: deterministic placement of the gold passage among distractors
//! - **evaluator**: answer extraction and correctness checking
//! - **reorder**: position-aware document ordering strategies
//! - **llm**: OpenAI-compatible client, prompt layouts and model runners
//! - **experiment**: dataset handling, the trial loop and result summaries

pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod experiment;
pub mod llm;
pub mod persistence;
pub mod qa;
pub mod reorder;

// Re-export commonly used types
pub use config::Config;
pub use context::{Context, build_context, build_prompt, derive_seed};
pub use error::{ExperimentError, Result};
pub use evaluator::{Verdict, check_answer, extract_answer};
pub use experiment::{Dataset, Experiment, ExperimentResults};
pub use llm::{LlmClient, ModelRunner};
pub use persistence::{load_results, save_results};
pub use qa::{DistractorPool, QaRecord};
pub use reorder::ReorderStrategy;
