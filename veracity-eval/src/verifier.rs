//! Liveness checks for cited links.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use veracity_common::{DeadLinkPolicy, Source};
use veracity_http::HttpClient;

/// Outcome of verifying one breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedBreakdown {
    /// Surviving items, in their original order.
    pub sources: Vec<Source>,
    /// Items whose link answered with a 2xx/3xx status.
    pub verified: usize,
    /// Items whose link failed the check.
    pub dead: usize,
}

#[derive(Clone)]
pub struct LinkVerifier {
    http: HttpClient,
    concurrency: usize,
    timeout: Duration,
    policy: DeadLinkPolicy,
}

impl LinkVerifier {
    pub fn new(http: HttpClient, concurrency: usize, timeout: Duration, policy: DeadLinkPolicy) -> Self {
        Self {
            http,
            concurrency: concurrency.max(1),
            timeout,
            policy,
        }
    }

    pub fn policy(&self) -> DeadLinkPolicy {
        self.policy
    }

    /// Probe one link. Any transport error counts as dead.
    pub async fn is_live(&self, link: &str) -> bool {
        match self.http.head(link, Some(self.timeout)).await {
            Ok(status) if status.is_success() || status.is_redirection() => true,
            Ok(status) => {
                tracing::warn!(link = %link, %status, "link verification failed");
                false
            }
            Err(e) => {
                tracing::warn!(link = %link, error = %e, "link verification error");
                false
            }
        }
    }

    /// Check every link with at most `concurrency` probes in flight, then
    /// apply the dead-link policy. Items without a link are never probed and
    /// never count as verified.
    pub async fn verify(&self, breakdown: Vec<Source>) -> VerifiedBreakdown {
        let checked: Vec<(Source, Option<bool>)> = stream::iter(breakdown)
            .map(|source| async move {
                let live = match source.link.as_deref() {
                    Some(link) => Some(self.is_live(link).await),
                    None => None,
                };
                (source, live)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut out = VerifiedBreakdown {
            sources: Vec::with_capacity(checked.len()),
            verified: 0,
            dead: 0,
        };

        for (mut source, live) in checked {
            match (live, self.policy) {
                (Some(true), _) => {
                    out.verified += 1;
                    out.sources.push(source);
                }
                (Some(false), DeadLinkPolicy::Null) => {
                    out.dead += 1;
                    source.link = None;
                    out.sources.push(source);
                }
                (Some(false), DeadLinkPolicy::Drop) => out.dead += 1,
                (None, DeadLinkPolicy::Null) => out.sources.push(source),
                (None, DeadLinkPolicy::Drop) => {}
            }
        }

        tracing::debug!(
            verified = out.verified,
            dead = out.dead,
            kept = out.sources.len(),
            policy = ?self.policy,
            "links verified"
        );
        out
    }
}
