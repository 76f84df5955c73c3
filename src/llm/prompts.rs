//! Prompt templates for positional question answering.
//!
//! Every template ends with an `Answer:` cue so the model replies with the
//! answer alone, which keeps evaluation to a short free-text span.

use crate::error::{ExperimentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection of prompt fragments.
pub struct Prompts;

impl Prompts {
    /// Instruction header for the standard prompt.
    pub fn instruction() -> &'static str {
        "Based on the following documents, answer the question. Give only the answer, no explanation."
    }

    /// Instruction header for the attention-refresher prompt.
    pub fn refresher_instruction() -> &'static str {
        "Answer the question based ONLY on the following documents. Give only the answer, no explanation."
    }

    /// Question and answer cue that close every prompt.
    pub fn question_block(question: &str) -> String {
        format!("Question: {}\nAnswer:", question)
    }

    /// Standard prompt: header, context, question, cue.
    pub fn standard(context: &str, question: &str) -> String {
        if context.is_empty() {
            return Self::question_block(question);
        }
        format!(
            "{}\n\n{}\n\n{}",
            Self::instruction(),
            context,
            Self::question_block(question)
        )
    }

    /// Attention-refresher prompt: repeats the question after the context so
    /// the model sees it close to the generation point.
    pub fn refresher(context: &str, question: &str) -> String {
        if context.is_empty() {
            return Self::question_block(question);
        }
        format!(
            "{}\n\n=== CONTEXT ===\n{}\n=== END CONTEXT ===\n\nReminder: the question is: \"{}\"\n\n{}",
            Self::refresher_instruction(),
            context,
            question,
            Self::question_block(question)
        )
    }

    /// Connectivity probe used by `LlmClient::test_connection`.
    pub fn connection_probe() -> &'static str {
        "Say 'hello' and nothing else."
    }
}

/// Which prompt layout to wrap a context in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Standard,
    Refresher,
}

impl PromptStyle {
    /// Render a prompt in this style.
    pub fn render(&self, context: &str, question: &str) -> String {
        match self {
            PromptStyle::Standard => Prompts::standard(context, question),
            PromptStyle::Refresher => Prompts::refresher(context, question),
        }
    }
}

impl FromStr for PromptStyle {
    type Err = ExperimentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PromptStyle::Standard),
            "refresher" => Ok(PromptStyle::Refresher),
            other => Err(ExperimentError::Config(format!(
                "Unknown prompt style '{}' (expected 'standard' or 'refresher')",
                other
            ))),
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStyle::Standard => write!(f, "standard"),
            PromptStyle::Refresher => write!(f, "refresher"),
        }
    }
}
