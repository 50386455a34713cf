//! The evaluation result returned for one submitted claim.
//!
//! These shapes only live for the duration of a request. Deserialization is
//! deliberately lenient because the input is model output: scores are matched
//! loosely, impacts may arrive as strings, and blank links collapse to `None`.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Five-step truthfulness scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Score {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Score {
    pub const ALL: [Score; 5] = [
        Score::VeryLow,
        Score::Low,
        Score::Medium,
        Score::High,
        Score::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Score::VeryLow => "Very Low",
            Score::Low => "Low",
            Score::Medium => "Medium",
            Score::High => "High",
            Score::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown score `{0}`")]
pub struct UnknownScore(pub String);

impl FromStr for Score {
    type Err = UnknownScore;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "very low" => Ok(Score::VeryLow),
            "low" => Ok(Score::Low),
            "medium" => Ok(Score::Medium),
            "high" => Ok(Score::High),
            "very high" => Ok(Score::VeryHigh),
            _ => Err(UnknownScore(raw.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One cited source backing the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_impact")]
    pub impact: f64,
}

/// Score, explanation and ranked source breakdown for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: Score,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub breakdown: Vec<Source>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let link = Option::<String>::deserialize(deserializer)?;
    Ok(link
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImpact {
    Number(f64),
    Text(String),
}

fn lenient_impact<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match Option::<RawImpact>::deserialize(deserializer)? {
        None => return Ok(0.0),
        Some(RawImpact::Number(n)) => n,
        Some(RawImpact::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("impact `{s}` is not a number")))?,
    };

    if !value.is_finite() {
        return Err(de::Error::custom("impact must be finite"));
    }
    Ok(value)
}
