//! Best-effort repair of model output into an [`Evaluation`].
//!
//! Models wrap JSON in code fences, add chatter around it, and leave trailing
//! commas. We strip the fences, take the outermost `{ ... }` span, drop
//! trailing commas and parse. Anything still unparseable is a hard failure.

use regex::Regex;
use std::sync::LazyLock;
use veracity_common::{Evaluation, Result, VeracityError};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?").expect("static regex"));
// Greedy: first `{` to last `}`. Braces in prose ahead of the object end up
// inside the span and the parse fails; no attempt is made to find a balanced
// object further in.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// Pull the JSON object out of `raw`, or `None` if there is no `{ ... }` span.
pub fn extract_json_object(raw: &str) -> Option<String> {
    let unfenced = CODE_FENCE.replace_all(raw, "");
    let object = JSON_OBJECT.find(unfenced.trim())?.as_str();
    Some(TRAILING_COMMA.replace_all(object, "$1").into_owned())
}

/// Repair and deserialize a model answer.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation> {
    let json = extract_json_object(raw).ok_or_else(|| {
        VeracityError::MalformedResponse("no JSON object found in model response".to_string())
    })?;

    serde_json::from_str::<Evaluation>(&json)
        .map_err(|e| VeracityError::MalformedResponse(format!("invalid evaluation JSON: {e}")))
}
