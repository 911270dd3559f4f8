mod config;
mod errors;
mod feedback;
mod llm_client;
mod moderation;
mod routes;
mod session;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{load_blocklist, load_stylesheet, Config};
use crate::llm_client::{CompletionModel, LlmClient};
use crate::moderation::Moderator;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting discussion forum v{}", env!("CARGO_PKG_VERSION"));

    // Moderation word list: built-in plus optional local additions, loaded once
    let extra_words = match &config.blocklist_path {
        Some(path) => load_blocklist(path)?,
        None => Vec::new(),
    };
    let moderator =
        Moderator::with_builtin(&extra_words).context("Failed to compile moderation word list")?;
    moderation::install(moderator);

    // Stylesheet is injected verbatim into rendered pages
    let stylesheet: Arc<str> = Arc::from(load_stylesheet(&config.stylesheet_path));
    info!(
        "Stylesheet loaded from {} ({} bytes)",
        config.stylesheet_path,
        stylesheet.len()
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        &config.ollama_url,
        &config.ollama_model,
        Duration::from_secs(config.llm_timeout_secs),
    )
    .context("Failed to build LLM HTTP client")?;
    info!(
        "LLM client initialized (model: {}, backend: {})",
        llm.model_name(),
        config.ollama_url
    );

    // Session registry with idle eviction
    let sessions = SessionStore::new(Duration::from_secs(config.session_idle_secs));
    if sessions.spawn_sweeper().is_some() {
        info!("Idle sessions expire after {}s", config.session_idle_secs);
    }

    // Build app state
    let state = AppState {
        sessions,
        llm: Arc::new(llm),
        config: config.clone(),
        stylesheet,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
