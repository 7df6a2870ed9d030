//! Prompt → slug resolution.
//!
//! Three stages, first hit wins:
//!
//! ```text
//! prompt
//!   │
//!   ├─ 1. intent map      keywords ⊆ prompt tokens        (no I/O)
//!   │
//!   ├─ 2. title match     prompt tokens ⊆ title tokens    (one directory fetch)
//!   │
//!   └─ 3. model fallback  forced `choose_slug` call over the first 50 labs
//!                         (reuses the listing from stage 2)
//! ```
//!
//! Model failures never escape: rate limits are logged as warnings, anything
//! else as errors, and both come back as "no match".

pub mod intent;

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::catalog::{CatalogError, LabDirectory};
use crate::llm::{LlmClient, LlmError, ToolDefinition};
use crate::types::Lab;

pub use intent::{tokenize, IntentMap, IntentRule};

/// Labs offered to the model.
pub const MODEL_MENU_LIMIT: usize = 50;

const CHOOSE_SLUG_SYSTEM_PROMPT: &str = "You map prompts to lab slugs.";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lab directory unavailable: {0}")]
    Directory(#[from] CatalogError),
}

/// Which stage produced a slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intent,
    Title,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Intent => write!(f, "intent"),
            Stage::Title => write!(f, "title"),
            Stage::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub slug: String,
    pub stage: Stage,
}

impl Resolution {
    fn new(slug: impl Into<String>, stage: Stage) -> Self {
        Self {
            slug: slug.into(),
            stage,
        }
    }
}

pub struct PromptResolver {
    intents: IntentMap,
    directory: Arc<dyn LabDirectory>,
    model: Option<Arc<dyn LlmClient>>,
    validate_model_slug: bool,
}

impl PromptResolver {
    pub fn new(intents: IntentMap, directory: Arc<dyn LabDirectory>) -> Self {
        Self {
            intents,
            directory,
            model: None,
            validate_model_slug: true,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LlmClient>) -> Self {
        self.model = Some(model);
        self
    }

    /// When set (the default), a slug picked by the model is only accepted if
    /// it names a lab in the fetched directory.
    pub fn validate_model_slug(mut self, validate: bool) -> Self {
        self.validate_model_slug = validate;
        self
    }

    /// Resolve `prompt` to a slug. `Ok(None)` means no stage matched.
    pub async fn resolve(&self, prompt: &str) -> Result<Option<Resolution>, ResolveError> {
        let tokens = tokenize(prompt);

        if let Some(rule) = self.intents.find(&tokens) {
            tracing::debug!(slug = %rule.slug, "intent rule matched");
            return Ok(Some(Resolution::new(rule.slug.clone(), Stage::Intent)));
        }

        let labs = self.directory.list_labs().await?;

        if let Some(lab) = labs
            .iter()
            .find(|lab| tokens.is_subset(&tokenize(lab.title_or_empty())))
        {
            tracing::debug!(slug = %lab.slug, "title matched");
            return Ok(Some(Resolution::new(lab.slug.clone(), Stage::Title)));
        }

        Ok(self
            .choose_with_model(prompt, &labs)
            .await
            .map(|slug| Resolution::new(slug, Stage::Model)))
    }

    /// Last-chance fallback. Never fails; every problem is logged and
    /// reported as no match.
    async fn choose_with_model(&self, prompt: &str, labs: &[Lab]) -> Option<String> {
        let model = match &self.model {
            Some(model) => model,
            None => {
                tracing::debug!("no completion model configured, skipping fallback");
                return None;
            }
        };

        let user_prompt = format!(
            "Prompt: {}\n\nAvailable labs:\n{}",
            prompt,
            build_menu(labs)
        );

        let result = match model
            .chat_with_tool(CHOOSE_SLUG_SYSTEM_PROMPT, &user_prompt, &choose_slug_tool())
            .await
        {
            Ok(result) => result,
            Err(LlmError::RateLimited(detail)) => {
                tracing::warn!(%detail, "model quota exceeded; skipping fallback");
                return None;
            }
            Err(e) => {
                tracing::error!(model = model.model_name(), "model fallback failed: {}", e);
                return None;
            }
        };

        let slug = match result.arguments.get("slug").and_then(|s| s.as_str()) {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => {
                tracing::warn!(arguments = %result.arguments, "model returned no slug");
                return None;
            }
        };

        if self.validate_model_slug && !labs.iter().any(|lab| lab.slug == slug) {
            tracing::warn!(%slug, "model picked a slug that is not in the directory");
            return None;
        }

        tracing::info!(%slug, model = model.model_name(), "model chose slug");
        Some(slug)
    }
}

/// `- slug: title` lines for the first [`MODEL_MENU_LIMIT`] labs.
pub fn build_menu(labs: &[Lab]) -> String {
    labs.iter()
        .take(MODEL_MENU_LIMIT)
        .map(|lab| format!("- {}: {}", lab.slug, lab.title_or_empty()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn choose_slug_tool() -> ToolDefinition {
    ToolDefinition {
        name: "choose_slug".to_string(),
        description: "Select the slug of the most relevant lab.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"slug": {"type": "string"}},
            "required": ["slug"]
        }),
    }
}
