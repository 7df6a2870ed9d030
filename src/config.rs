//! Runtime configuration.
//!
//! Every option can be given as a flag or as the environment variable named
//! next to it. `.env` is loaded by `main` before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::catalog::InstruqtConfig;
use crate::llm::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Clone)]
#[command(
    name = "lab_router",
    version,
    about = "Maps natural-language prompts to Instruqt labs and returns one-click invite links"
)]
pub struct Config {
    /// Instruqt API token
    #[arg(long, env = "INSTRUQT_API_TOKEN", hide_env_values = true)]
    pub instruqt_api_token: String,

    /// Instruqt GraphQL endpoint
    #[arg(
        long,
        env = "INSTRUQT_API_URL",
        default_value = "https://play.instruqt.com/graphql"
    )]
    pub instruqt_api_url: String,

    /// Team whose tracks are listed and invited to
    #[arg(long, env = "INSTRUQT_TEAM_SLUG")]
    pub instruqt_team_slug: String,

    /// Base URL used to build invite links
    #[arg(long, env = "INSTRUQT_PLAY_URL", default_value = "https://play.instruqt.com")]
    pub instruqt_play_url: String,

    /// Timeout for catalog requests, in seconds
    #[arg(long, env = "CATALOG_TIMEOUT_SECS", default_value_t = 30)]
    pub catalog_timeout_secs: u64,

    /// Shared secret callers send as `Authorization: Bearer <key>`
    #[arg(long, env = "ROUTER_API_KEY", hide_env_values = true)]
    pub router_api_key: String,

    /// OpenAI key; without it the model fallback is disabled
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Timeout for the model fallback call, in seconds
    #[arg(long, env = "MODEL_TIMEOUT_SECS", default_value_t = 30)]
    pub model_timeout_secs: u64,

    /// Only accept model-picked slugs that exist in the directory
    #[arg(
        long,
        env = "VALIDATE_MODEL_SLUG",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub validate_model_slug: bool,

    /// YAML file replacing the built-in intent rules
    #[arg(long, env = "INTENT_RULES_FILE")]
    pub intent_rules_file: Option<PathBuf>,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn instruqt(&self) -> InstruqtConfig {
        InstruqtConfig {
            api_url: self.instruqt_api_url.clone(),
            api_token: self.instruqt_api_token.clone(),
            team_slug: self.instruqt_team_slug.clone(),
            play_url: self.instruqt_play_url.clone(),
            timeout: Duration::from_secs(self.catalog_timeout_secs),
        }
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Model key, treating an empty value as unset.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }
}
