//! Instruction template and function schema for claim assessment.

use serde_json::json;
use veracity_common::{ResponseMode, Score};

use crate::traits::FunctionSpec;

pub const EVALUATION_FUNCTION_NAME: &str = "submit_evaluation";

const SOURCE_GUIDANCE: &str = r#"Evaluate the truthfulness of the following statement. Provide a score from Very Low to Very High and include a detailed explanation with references. Additionally, provide a breakdown of the sources used, with each source's contribution to the truthfulness score. Attempt to find 15 high-quality sources based on impact and relevance.

For each source:
1. Prioritize links that are confirmed up-to-date and scraped within the last two years.
2. Exclude any links that might return HTTP errors like 404 (Not Found), 500 (Internal Server Error), 401 (Unauthorized), or 403 (Forbidden).
3. Prefer academic (.edu) and government (.gov) sources over mainstream news sites.
4. Use official, reputable, or well-known government or educational institutions, such as NASA, major universities, or government agencies.
5. Select only live links; replace any link that is no longer live before responding.
6. Do not send links that 404.
7. Prioritize PDF documents and court documents or legal rulings over regular websites.
8. Give each source an "impact": a signed number for how strongly it moved the score; negative values undermine the statement."#;

const TEXT_OUTPUT_RULES: &str = r#"Respond strictly with a JSON object containing the fields "score", "evidence", and "breakdown" (an array of objects with "source", "link", "descriptor", "summary", and "impact"). Ensure no extra text outside of the JSON object is included in the response."#;

const FUNCTION_OUTPUT_RULES: &str = "Return your assessment by calling the submit_evaluation function. Do not answer in plain text.";

/// Embed the claim into the fixed instruction template.
pub fn build_evaluation_prompt(input: &str, mode: ResponseMode) -> String {
    let rules = match mode {
        ResponseMode::Text => TEXT_OUTPUT_RULES,
        ResponseMode::FunctionCall => FUNCTION_OUTPUT_RULES,
    };
    format!("{SOURCE_GUIDANCE}\n\nInput: {input}\n\n{rules}")
}

/// Schema the model must satisfy in function-call mode.
pub fn evaluation_function() -> FunctionSpec {
    let scores: Vec<&str> = Score::ALL.iter().map(Score::as_str).collect();

    FunctionSpec {
        name: EVALUATION_FUNCTION_NAME.to_string(),
        description: "Submit a truthfulness evaluation of the statement with its supporting sources."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "score": {
                    "type": "string",
                    "enum": scores,
                    "description": "Overall truthfulness of the statement."
                },
                "evidence": {
                    "type": "string",
                    "description": "Detailed explanation of the score with references."
                },
                "breakdown": {
                    "type": "array",
                    "description": "Sources consulted, each with its contribution to the score.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "source": { "type": "string", "description": "Publisher or institution." },
                            "link": { "type": "string", "description": "Direct, live URL to the source." },
                            "descriptor": { "type": "string", "description": "Kind of source, e.g. government report." },
                            "summary": { "type": "string", "description": "What the source says about the statement." },
                            "impact": {
                                "type": "number",
                                "description": "Signed contribution to the score; negative values undermine the statement."
                            }
                        },
                        "required": ["source", "link", "descriptor", "summary", "impact"]
                    }
                }
            },
            "required": ["score", "evidence", "breakdown"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_input_verbatim() {
        let prompt = build_evaluation_prompt("The moon is made of cheese.", ResponseMode::Text);
        assert!(prompt.contains("Input: The moon is made of cheese."));
        assert!(prompt.contains("Respond strictly with a JSON object"));
    }

    #[test]
    fn function_prompt_points_at_the_function() {
        let prompt = build_evaluation_prompt("Water boils at 100C", ResponseMode::FunctionCall);
        assert!(prompt.contains(EVALUATION_FUNCTION_NAME));
        assert!(!prompt.contains("Respond strictly with a JSON object"));
    }

    #[test]
    fn schema_lists_every_score() {
        let spec = evaluation_function();
        let scores = spec.parameters["properties"]["score"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(scores, ["Very Low", "Low", "Medium", "High", "Very High"]);
        assert_eq!(spec.parameters["required"], json!(["score", "evidence", "breakdown"]));
    }
}
