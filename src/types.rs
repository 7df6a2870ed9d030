//! Wire types shared by the catalog clients, the resolver and the HTTP layer.

use serde::{Deserialize, Serialize};

/// A lab (Instruqt "track") as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Lab {
    /// Title or the empty string when the catalog has none.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// A freshly created one-click invite for a lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub slug: String,
    pub invite_url: String,
}

/// Body of `POST /resolve`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Slug carried by `POST /invite`, either in the query string or the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteParams {
    #[serde(default)]
    pub slug: Option<String>,
}
