//! Common types and utilities shared across Veracity crates.
//!
//! This crate defines the evaluation data model, observability helpers, and
//! the shared error type used throughout the Veracity workspace. It is
//! intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`Evaluation`], [`Source`] and [`Score`]: the per-request result shapes
//! - [`ResponseMode`] and [`DeadLinkPolicy`]: behavior switches read from config
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`VeracityError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use veracity_common::{Score, VeracityError};
//!
//! let score: Score = "very high".parse().unwrap();
//! assert_eq!(score.to_string(), "Very High");
//!
//! let err = VeracityError::EmptyInput;
//! assert!(err.is_client_error());
//! ```

pub mod evaluation;
pub mod modes;
pub mod observability;

pub use evaluation::{Evaluation, Score, Source};
pub use modes::{DeadLinkPolicy, ResponseMode};

/// Error types used across the Veracity system.
///
/// Every failure a request can hit collapses into one of four buckets:
/// blocked input, insufficient verified sources, a malformed model response,
/// or an upstream failure. [`VeracityError::is_client_error`] tells them apart
/// for status mapping.
#[derive(thiserror::Error, Debug)]
pub enum VeracityError {
    /// The submission was empty after trimming.
    #[error("empty input")]
    EmptyInput,

    /// The submission exceeded the configured character budget.
    #[error("input too long: {len} chars (max {max})")]
    InputTooLong { len: usize, max: usize },

    /// The submission matched a configured deny pattern.
    #[error("input matched deny pattern `{0}`")]
    InjectionPattern(String),

    /// The moderation service flagged the submission.
    #[error("moderation flagged input: {}", .0.join(", "))]
    ModerationFlagged(Vec<String>),

    /// The moderation service could not be consulted; treated as a rejection.
    #[error("moderation unavailable: {0}")]
    ModerationUnavailable(String),

    /// The model answered, but not with anything we could parse.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// Too few sources survived link verification.
    #[error("not enough verified sources: {verified} (need {required})")]
    InsufficientSources { verified: usize, required: usize },

    /// The completion API (or anything else upstream) failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VeracityError {
    /// Whether the failure is attributable to the submitted input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::InputTooLong { .. }
                | Self::InjectionPattern(_)
                | Self::ModerationFlagged(_)
                | Self::ModerationUnavailable(_)
        )
    }

    /// Message safe to show to the person who submitted the claim.
    ///
    /// Internal detail (pattern text, upstream bodies) never leaks through here.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please provide an input statement.",
            Self::InputTooLong { .. } => "Your submission is too long.",
            Self::InjectionPattern(_) => {
                "Your submission was flagged for potential injection attacks."
            }
            Self::ModerationFlagged(_) | Self::ModerationUnavailable(_) => {
                "Your submission was flagged by content moderation."
            }
            Self::InsufficientSources { .. } => {
                "Not enough valid sources found. Please try again with a different statement."
            }
            Self::MalformedResponse(_) | Self::Upstream(_) | Self::Config(_) => {
                "Failed to get a response from the AI."
            }
        }
    }
}

/// Convenient alias for results that use [`VeracityError`].
pub type Result<T> = std::result::Result<T, VeracityError>;
