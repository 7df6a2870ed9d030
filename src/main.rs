//! lab_router: HTTP gateway binary.
//!
//! Configuration comes from flags or env vars (see `lab_router --help`);
//! a `.env` file in the working directory is loaded first.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use lab_router::catalog::InstruqtClient;
use lab_router::config::{Config, LogFormat};
use lab_router::llm::OpenAiClient;
use lab_router::middleware::auth::ApiKey;
use lab_router::resolver::{IntentMap, PromptResolver};
use lab_router::router::{build_router, Services};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,lab_router=debug,tower_http=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_format);

    let intents = match &config.intent_rules_file {
        Some(path) => IntentMap::from_yaml_file(path)?,
        None => IntentMap::builtin(),
    };
    tracing::info!(rules = intents.len(), "intent map loaded");

    let instruqt = Arc::new(
        InstruqtClient::new(config.instruqt()).context("failed to create Instruqt client")?,
    );
    tracing::info!(team = instruqt.team_slug(), "catalog client ready");

    let mut resolver = PromptResolver::new(intents, instruqt.clone())
        .validate_model_slug(config.validate_model_slug);
    match config.openai_api_key() {
        Some(key) => {
            let model = OpenAiClient::new(
                key.to_string(),
                &config.openai_model,
                &config.openai_base_url,
                config.model_timeout(),
            )
            .context("failed to create OpenAI client")?;
            tracing::info!(model = %config.openai_model, "model fallback enabled");
            resolver = resolver.with_model(Arc::new(model));
        }
        None => tracing::warn!("OPENAI_API_KEY not set; model fallback disabled"),
    }

    let services = Services {
        directory: instruqt.clone(),
        issuer: instruqt,
        resolver: Arc::new(resolver),
    };
    let app = build_router(services, ApiKey::new(&config.router_api_key));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("lab_router listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    Ok(())
}
