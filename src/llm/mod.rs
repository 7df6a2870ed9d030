//! Completion model boundary.
//!
//! The resolver only ever needs one thing from a model: a forced function
//! call whose JSON arguments it can read. Rate limiting is a distinct error
//! so the caller can downgrade it quietly.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::OpenAiClient;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model quota exceeded: {0}")]
    RateLimited(String),

    #[error("model request timed out")]
    Timeout,

    #[error("model request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}

/// Function definition used to force structured output.
///
/// Maps to the `functions` array plus `function_call: {name}` on
/// OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: serde_json::Value,
}

/// Arguments the model returned for a forced function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Call the model with a single function it must invoke.
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
