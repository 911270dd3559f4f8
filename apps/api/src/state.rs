use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionModel;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Feedback model. `LlmClient` in production, a scripted stub in tests.
    pub llm: Arc<dyn CompletionModel>,
    pub config: Config,
    /// Stylesheet read once at startup and served verbatim.
    pub stylesheet: Arc<str>,
}
