//! Experiment driver: loads a dataset, runs every (position, question)
//! trial against a model and aggregates accuracy by gold position.

pub mod dataset;
pub mod results;
pub mod runner;

pub use dataset::{Dataset, create_sample_dataset, load_distractors, load_qa_pairs};
pub use results::{ExperimentResults, PositionSummary, RunConfig, TrialResult};
pub use runner::{Experiment, ExperimentSettings};
