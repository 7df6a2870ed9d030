//! lab-router maps natural-language prompts to Instruqt labs and hands
//! back one-click invite links.
//!
//! Modules, leaves first:
//! - [`catalog`]: lab directory and invite issuer (Instruqt GraphQL)
//! - [`llm`]: forced function-call completions (OpenAI)
//! - [`resolver`]: intent map → title match → model fallback
//! - [`router`]: axum routes, auth and logging middleware

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod resolver;
pub mod router;
pub mod types;

pub use error::AppError;
pub use resolver::{PromptResolver, Resolution, Stage};
pub use types::{Invite, Lab};
