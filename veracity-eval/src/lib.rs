//! Claim evaluation pipeline.
//!
//! [`Evaluator`] screens the input ([`guard`]), optionally consults the
//! moderation service, asks the model for an assessment, probes every cited
//! link ([`verifier`]) and returns the strongest sources first ([`ranker`]).

pub mod guard;
pub mod pipeline;
pub mod ranker;
pub mod verifier;

pub use guard::InputGuard;
pub use pipeline::Evaluator;
pub use ranker::Ranker;
pub use verifier::{LinkVerifier, VerifiedBreakdown};
