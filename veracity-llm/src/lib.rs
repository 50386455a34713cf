//! LLM integration for Veracity.
//!
//! This crate exposes a provider-agnostic [`traits::LlmClient`] interface with
//! an OpenAI-compatible chat-completions implementation, the
//! [`moderation::Moderator`] pre-check, the claim prompt and function schema
//! ([`prompt`]), and the model-output repair step ([`repair`]).
//!
//! # Examples
//! ```no_run
//! use veracity_common::{ResponseMode, Result};
//! use veracity_config::LlmConfig;
//! use veracity_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::default(); // api key from OPENAI_API_KEY
//! let client = ensure_llm_ready(&cfg)?;
//! let evaluation = client
//!     .assess_claim("Water boils at 100C at sea level.", ResponseMode::Text)
//!     .await?;
//! println!("{}", evaluation.score);
//! # Ok(())
//! # }
//! ```
pub mod moderation;
pub mod openai;
pub mod prompt;
pub mod repair;
pub mod traits;

use moderation::{Moderator, OpenAiModerator};
use openai::OpenAiClient;
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;
use veracity_common::VeracityError;
use veracity_config::{LlmConfig, ModerationConfig};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build the completion client described by `config`.
pub fn ensure_llm_ready(
    config: &LlmConfig,
) -> veracity_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    let api_key = config
        .api_key()
        .ok_or_else(|| VeracityError::Config("no API key configured for llm".to_string()))?;

    let client = OpenAiClient::with_endpoint(&config.endpoint, api_key, config.model.clone())?
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
        .with_timeout(Duration::from_secs(config.timeout_secs));

    tracing::info!(model = %config.model, endpoint = %config.endpoint, "llm client ready");
    Ok(Arc::new(client))
}

/// Build the moderation client, or `None` when moderation is disabled.
///
/// Shares the LLM endpoint and credential unless the moderation section
/// overrides the endpoint.
pub fn build_moderator(
    moderation: &ModerationConfig,
    llm: &LlmConfig,
) -> veracity_common::Result<Option<Arc<dyn Moderator + Send + Sync + 'static>>> {
    if !moderation.enabled {
        return Ok(None);
    }

    let api_key = llm
        .api_key()
        .ok_or_else(|| VeracityError::Config("no API key configured for moderation".to_string()))?;
    let endpoint = moderation.endpoint.as_deref().unwrap_or(&llm.endpoint);

    let moderator = OpenAiModerator::new(endpoint, api_key, moderation.model.clone())?
        .with_timeout(Duration::from_secs(moderation.timeout_secs));

    tracing::info!(endpoint = %endpoint, "moderation enabled");
    Ok(Some(Arc::new(moderator)))
}
