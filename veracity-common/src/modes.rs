use crate::{Result, VeracityError};

/// How the model is asked to shape its answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Free text that should contain one JSON object.
    #[default]
    Text,
    /// A forced function call whose arguments are the evaluation.
    FunctionCall,
}

impl ResponseMode {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "text" | "json" => Ok(Self::Text),
            "function_call" | "function-call" | "functioncall" | "tool" | "tools" => {
                Ok(Self::FunctionCall)
            }
            _ => Err(VeracityError::Config(format!(
                "unsupported llm.response_mode: {raw}"
            ))),
        }
    }
}

/// What happens to a breakdown item whose link fails verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeadLinkPolicy {
    /// Keep the item, clear its link.
    #[default]
    Null,
    /// Remove the item from the breakdown.
    Drop,
}

impl DeadLinkPolicy {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "null" | "nullify" | "clear" => Ok(Self::Null),
            "drop" | "remove" => Ok(Self::Drop),
            _ => Err(VeracityError::Config(format!(
                "unsupported verifier.dead_links: {raw}"
            ))),
        }
    }
}
