use std::sync::Arc;
use std::time::Duration;

use veracity_common::{Evaluation, ResponseMode, Result, VeracityError};
use veracity_config::VeracityConfig;
use veracity_http::HttpClient;
use veracity_llm::moderation::Moderator;
use veracity_llm::traits::LlmClient;

use crate::guard::InputGuard;
use crate::ranker::Ranker;
use crate::verifier::LinkVerifier;

/// One full claim evaluation: guard, moderation, model call, link
/// verification, sufficiency check, ranking.
#[derive(Clone)]
pub struct Evaluator {
    guard: InputGuard,
    moderator: Option<Arc<dyn Moderator + Send + Sync>>,
    llm: Arc<dyn LlmClient + Send + Sync>,
    verifier: LinkVerifier,
    ranker: Ranker,
    min_sources: usize,
    mode: ResponseMode,
}

impl Evaluator {
    pub fn new(
        guard: InputGuard,
        moderator: Option<Arc<dyn Moderator + Send + Sync>>,
        llm: Arc<dyn LlmClient + Send + Sync>,
        verifier: LinkVerifier,
        ranker: Ranker,
        min_sources: usize,
        mode: ResponseMode,
    ) -> Self {
        Self {
            guard,
            moderator,
            llm,
            verifier,
            ranker,
            min_sources,
            mode,
        }
    }

    /// Wire every stage from a validated config.
    pub fn from_config(config: &VeracityConfig) -> Result<Self> {
        let guard = match &config.guard.patterns_file {
            Some(path) => InputGuard::load(path, config.guard.max_input_chars)?,
            None => {
                tracing::warn!("no deny pattern file configured; only length checks apply");
                InputGuard::without_patterns(config.guard.max_input_chars)
            }
        };

        let llm = veracity_llm::ensure_llm_ready(&config.llm)?;
        let moderator = veracity_llm::build_moderator(&config.moderation, &config.llm)?;
        let verifier = link_verifier(config)?;

        Ok(Self::new(
            guard,
            moderator,
            llm,
            verifier,
            Ranker::new(config.verifier.max_sources),
            config.verifier.min_sources,
            config.llm.response_mode()?,
        ))
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.llm.health_check().await
    }

    /// Evaluate one claim. Each stage short-circuits on failure, so blocked
    /// input never reaches moderation or the model.
    pub async fn evaluate(&self, input: &str) -> Result<Evaluation> {
        let claim = self.guard.check(input).inspect_err(|e| {
            tracing::warn!(error = %e, "input rejected by guard");
        })?;

        if let Some(moderator) = &self.moderator {
            let verdict = moderator.moderate(claim).await.inspect_err(|e| {
                tracing::error!(error = %e, "moderation failed; rejecting input");
            })?;
            if verdict.flagged {
                tracing::warn!(categories = ?verdict.categories, "input flagged by moderation");
                return Err(VeracityError::ModerationFlagged(verdict.categories));
            }
        }

        let evaluation = self.llm.assess_claim(claim, self.mode).await?;
        let proposed = evaluation.breakdown.len();

        let checked = self.verifier.verify(evaluation.breakdown).await;
        if checked.verified < self.min_sources {
            tracing::warn!(
                proposed,
                verified = checked.verified,
                required = self.min_sources,
                "not enough verified sources"
            );
            return Err(VeracityError::InsufficientSources {
                verified: checked.verified,
                required: self.min_sources,
            });
        }

        let breakdown = self.ranker.rank(checked.sources);
        tracing::info!(
            score = %evaluation.score,
            proposed,
            verified = checked.verified,
            dead = checked.dead,
            returned = breakdown.len(),
            "claim evaluated"
        );

        Ok(Evaluation {
            score: evaluation.score,
            evidence: evaluation.evidence,
            breakdown,
        })
    }
}

fn link_verifier(config: &VeracityConfig) -> Result<LinkVerifier> {
    let v = &config.verifier;
    let http = HttpClient::without_base(v.max_redirects)
        .map_err(|e| VeracityError::Config(format!("link checker: {e}")))?;
    Ok(LinkVerifier::new(
        http,
        v.concurrency,
        Duration::from_millis(v.timeout_ms),
        v.dead_links()?,
    ))
}
