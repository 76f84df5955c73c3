//! LLM integration module.
//!
//! Provides an OpenAI-compatible client, the prompt layouts wrapped around
//! a context, and the runner abstraction the experiment drives.

mod client;
mod prompts;
mod runner;

pub use client::{LlmClient, LlmResponse, Message, Role, TokenUsage};
pub use prompts::{PromptStyle, Prompts};
pub use runner::{DRY_RUN_MODEL_ID, DRY_RUN_RESPONSE, DryRunRunner, Generation, LlmRunner, ModelRunner};
