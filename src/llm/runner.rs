//! Model inference seam.
//!
//! The experiment only needs "prompt in, text out". [`ModelRunner`] is that
//! capability; [`LlmRunner`] backs it with an HTTP model server and
//! [`DryRunRunner`] with a fixed reply for pipeline checks.

use super::client::LlmClient;
use crate::config::LlmConfig;
use crate::error::Result;
use std::future::Future;
use std::time::Instant;

/// Text reply shown by [`DryRunRunner`].
pub const DRY_RUN_RESPONSE: &str = "[DRY RUN - no actual inference]";

/// Model id recorded for [`DryRunRunner`] results.
pub const DRY_RUN_MODEL_ID: &str = "dry-run";

/// One model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub latency_ms: f64,
}

/// Anything that turns a prompt into a reply.
pub trait ModelRunner {
    /// Display name recorded in results.
    fn name(&self) -> &str;

    /// Identifier of the model that actually answers. Defaults to the name.
    fn id(&self) -> &str {
        self.name()
    }

    /// Generate a reply for `prompt`.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<Generation>> + Send;
}

/// Runner backed by an OpenAI-compatible server.
#[derive(Clone)]
pub struct LlmRunner {
    client: LlmClient,
    name: Option<String>,
}

impl LlmRunner {
    pub fn new(client: LlmClient) -> Self {
        Self { client, name: None }
    }

    pub fn from_config(config: LlmConfig) -> Self {
        Self::new(LlmClient::new(config))
    }

    /// Record results under `name` instead of the server-side model id.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl ModelRunner for LlmRunner {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.client.model())
    }

    fn id(&self) -> &str {
        self.client.model()
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let start = Instant::now();
        let text = self.client.complete(None, prompt).await?;
        Ok(Generation {
            text: text.trim().to_string(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// Runner that never calls a model.
#[derive(Debug, Clone)]
pub struct DryRunRunner {
    name: String,
}

impl DryRunRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ModelRunner for DryRunRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        DRY_RUN_MODEL_ID
    }

    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        Ok(Generation {
            text: DRY_RUN_RESPONSE.to_string(),
            latency_ms: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_runner() {
        let runner = DryRunRunner::new("gemma-2b");
        assert_eq!(runner.name(), "gemma-2b");

        let generation = tokio_test::block_on(runner.generate("What is 2+2?")).unwrap();
        assert_eq!(generation.text, DRY_RUN_RESPONSE);
        assert_eq!(generation.latency_ms, 0.0);
    }

    #[test]
    fn test_llm_runner_name_is_model() {
        let config = LlmConfig {
            api_base: "http://localhost:8000".to_string(),
            model: "llama-3.2-3b".to_string(),
            ..Default::default()
        };
        let runner = LlmRunner::from_config(config);
        assert_eq!(runner.name(), "llama-3.2-3b");
        assert_eq!(runner.id(), "llama-3.2-3b");

        let labelled = runner.with_name("llama-3b");
        assert_eq!(labelled.name(), "llama-3b");
        assert_eq!(labelled.id(), "llama-3.2-3b");
    }
}
