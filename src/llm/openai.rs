//! OpenAI Client
//!
//! Chat completions with forced function calling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{LlmClient, LlmError, Result, ToolCallResult, ToolDefinition};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Transport)?;
        Ok(Self {
            api_key,
            client,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    // OpenAI returns arguments as a JSON string
    arguments: String,
}

#[derive(Deserialize)]
struct Message {
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

/// Map a non-success status to an error. 429 is the quota signal.
fn status_error(status: StatusCode, body: String) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(body)
    } else {
        LlmError::Api {
            status: status.as_u16(),
            body,
        }
    }
}

/// Pull the function call out of a chat completion body.
fn parse_function_call(response_text: &str) -> Result<ToolCallResult> {
    let api_response: ApiResponse = serde_json::from_str(response_text)
        .map_err(|e| LlmError::Malformed(format!("failed to parse response: {}", e)))?;

    let function_call = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.function_call)
        .ok_or_else(|| LlmError::Malformed("no function_call in response".into()))?;

    let arguments: serde_json::Value = serde_json::from_str(&function_call.arguments)
        .map_err(|e| LlmError::Malformed(format!("failed to parse function arguments: {}", e)))?;

    Ok(ToolCallResult {
        tool_name: function_call.name,
        arguments,
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": &self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "functions": [{
                    "name": &tool.name,
                    "description": &tool.description,
                    "parameters": &tool.parameters
                }],
                "function_call": {"name": &tool.name}
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let response_text = response.text().await?;
        tracing::debug!(
            "OpenAI raw response: {}",
            response_text.chars().take(1000).collect::<String>()
        );

        parse_function_call(&response_text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
