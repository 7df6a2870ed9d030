//! Catalog boundary: the lab directory and the invite issuer.
//!
//! Both are traits so the resolver and the HTTP layer never depend on the
//! concrete GraphQL client. [`InstruqtClient`] implements both.

pub mod instruqt;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Lab;

pub use instruqt::{InstruqtClient, InstruqtConfig};

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("catalog GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("unknown track '{0}'")]
    UnknownTrack(String),

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

/// Lists the labs visible to the configured team.
#[async_trait]
pub trait LabDirectory: Send + Sync {
    async fn list_labs(&self) -> Result<Vec<Lab>>;
}

/// Creates single-use invite links.
#[async_trait]
pub trait InviteIssuer: Send + Sync {
    /// Returns the invite URL for `slug`.
    async fn create_invite(&self, slug: &str) -> Result<String>;
}
