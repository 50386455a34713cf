//! External content moderation check run before a claim reaches the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use veracity_common::{Result, VeracityError};
use veracity_http::HttpClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub flagged: bool,
    /// Names of the categories that tripped, sorted.
    pub categories: Vec<String>,
}

#[async_trait]
pub trait Moderator: Send + Sync {
    /// Classify `input`. Any failure to obtain a verdict is an error; callers
    /// treat errors the same as a flagged verdict.
    async fn moderate(&self, input: &str) -> Result<ModerationVerdict>;
}

pub struct OpenAiModerator {
    client: HttpClient,
    api_key: String,
    model: Option<String>,
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

impl OpenAiModerator {
    pub fn new(endpoint: &str, api_key: String, model: Option<String>) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| VeracityError::Config(format!("HttpClient init failed: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl Moderator for OpenAiModerator {
    async fn moderate(&self, input: &str) -> Result<ModerationVerdict> {
        let req = ModerationRequest {
            input,
            model: self.model.as_deref(),
        };

        let resp: ModerationResponse = self
            .client
            .post_json("moderations", Some(&self.api_key), &req)
            .await
            .map_err(|e| VeracityError::ModerationUnavailable(e.to_string()))?;

        let result = resp.results.into_iter().next().ok_or_else(|| {
            VeracityError::ModerationUnavailable("moderation returned no results".to_string())
        })?;

        let categories = result
            .categories
            .into_iter()
            .filter_map(|(name, hit)| hit.then_some(name))
            .collect::<Vec<_>>();

        tracing::debug!(flagged = result.flagged, ?categories, "moderation.verdict");
        Ok(ModerationVerdict {
            flagged: result.flagged,
            categories,
        })
    }
}
