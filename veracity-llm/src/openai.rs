use crate::traits::{FunctionSpec, LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use veracity_common::{Result, VeracityError};
use veracity_http::{HttpClient, HttpError};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and compatible gateways.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSpec<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionSpec,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a new client against the public OpenAI endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(OPENAI_API_BASE, api_key, model)
    }

    /// Create a client against any OpenAI-compatible base URL
    /// (e.g. `https://gateway.example.com/v1`).
    pub fn with_endpoint(endpoint: &str, api_key: String, model: String) -> Result<Self> {
        let client = HttpClient::new(endpoint)
            .map_err(|e| VeracityError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens: None,
            temperature: None,
        })
    }

    /// Default `max_tokens` when a call does not specify one.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        function: Option<&FunctionSpec>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: max_tokens.or(self.max_tokens),
            temperature: temperature.or(self.temperature),
            tools: function.map(|f| {
                vec![ToolSpec {
                    kind: "function",
                    function: f,
                }]
            }),
            tool_choice: function.map(|f| json!({ "type": "function", "function": { "name": f.name } })),
        };

        tracing::debug!(
            model = %self.model,
            function = ?function.map(|f| f.name.as_str()),
            prompt_chars = prompt.len(),
            "openai.chat_completion.start"
        );

        let resp: ChatCompletionResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(http_to_veracity)?;

        let choice = resp.choices.into_iter().next().ok_or_else(|| {
            VeracityError::MalformedResponse("completion contained no choices".to_string())
        })?;

        let function_arguments = choice
            .message
            .tool_calls
            .into_iter()
            .find(|call| function.is_none_or(|f| f.name == call.function.name))
            .map(|call| call.function.arguments);

        let tokens_used = resp.usage.and_then(|u| u.total_tokens);
        tracing::debug!(
            finish_reason = ?choice.finish_reason,
            tokens_used = ?tokens_used,
            has_function_call = function_arguments.is_some(),
            "openai.chat_completion.done"
        );

        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            function_arguments,
            model: resp.model,
            tokens_used,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.complete(prompt, system_prompt, None, max_tokens, temperature)
            .await
    }

    async fn generate_with_function(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        function: &FunctionSpec,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.complete(prompt, system_prompt, Some(function), max_tokens, temperature)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let test_prompt = "Respond with just 'OK'";

        match self.generate(test_prompt, None, Some(5), Some(0.0)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAi health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

pub(crate) fn http_to_veracity(e: HttpError) -> VeracityError {
    VeracityError::Upstream(format!("{e}"))
}
