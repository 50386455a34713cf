use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use veracity_common::{Evaluation, ResponseMode, Result, VeracityError};

use crate::{prompt, repair};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    /// Raw argument string of the first function call, when the model made one.
    pub function_arguments: Option<String>,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// A function the model may be forced to call, described by a JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Generate while forcing a call to `function`. Providers without function
    /// calling fall back to plain generation and leave `function_arguments` empty.
    async fn generate_with_function(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        function: &FunctionSpec,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        tracing::debug!(function = %function.name, "function calling unsupported; using plain generation");
        self.generate(prompt, system_prompt, max_tokens, temperature)
            .await
    }

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Ask the model for a truthfulness assessment of `claim` and parse it.
    ///
    /// The returned breakdown is exactly what the model produced; link
    /// verification and ranking happen downstream.
    async fn assess_claim(&self, claim: &str, mode: ResponseMode) -> Result<Evaluation> {
        let prompt = prompt::build_evaluation_prompt(claim, mode);

        let response = match mode {
            ResponseMode::Text => self.generate(&prompt, None, None, None).await?,
            ResponseMode::FunctionCall => {
                let function = prompt::evaluation_function();
                self.generate_with_function(&prompt, None, &function, None, None)
                    .await?
            }
        };

        let raw = response
            .function_arguments
            .as_deref()
            .filter(|args| !args.trim().is_empty())
            .unwrap_or(&response.text);

        if raw.trim().is_empty() {
            tracing::warn!(model = ?response.model, "model returned an empty completion");
            return Err(VeracityError::MalformedResponse(
                "empty completion".to_string(),
            ));
        }

        repair::parse_evaluation(raw).inspect_err(|e| {
            tracing::error!(error = %e, "failed to parse evaluation from model response");
            tracing::debug!(raw_response = %raw, "full model response");
        })
    }
}
