//! Axum route handlers for feedback generation, selection and finalization.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::generator::{generate_options, FeedbackChoice, FeedbackOptions};
use crate::session::{FeedbackKey, FinalizedFeedback, SessionError};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateFeedbackRequest {
    pub topic: String,
    pub response_index: usize,
    /// Falls back to `DEFAULT_WORD_LIMIT` when omitted.
    pub word_limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateFeedbackResponse {
    pub topic: String,
    pub response_index: usize,
    pub selected: FeedbackChoice,
    pub options: FeedbackOptions,
}

#[derive(Debug, Deserialize)]
pub struct SelectFeedbackRequest {
    pub topic: String,
    pub response_index: usize,
    pub choice: FeedbackChoice,
}

#[derive(Debug, Serialize)]
pub struct SelectFeedbackResponse {
    pub selected: FeedbackChoice,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeFeedbackRequest {
    pub topic: String,
    pub response_index: usize,
    pub choice: Option<FeedbackChoice>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub topic: String,
    pub response_index: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:session_id/feedback
///
/// Generates both feedback options for one response and keeps them pending
/// until a teacher finalizes one. A model failure stores nothing.
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateFeedbackRequest>,
) -> Result<Json<GenerateFeedbackResponse>, AppError> {
    let key = FeedbackKey::new(request.topic, request.response_index);
    let word_limit = request
        .word_limit
        .unwrap_or(state.config.default_word_limit);

    let response_text = state
        .sessions
        .read(session_id, |s| s.response(&key).map(str::to_string))
        .await?;

    // No lock is held while the model runs.
    let options =
        generate_options(state.llm.as_ref(), &key.topic, &response_text, word_limit).await?;

    let selected = state
        .sessions
        .write(session_id, |s| {
            s.store_drafts(key.clone(), options.clone())?;
            Ok(s.selection(&key))
        })
        .await?;

    info!(
        "Session {session_id}: feedback drafts ready for response {} of {:?}",
        key.index, key.topic
    );

    Ok(Json(GenerateFeedbackResponse {
        topic: key.topic,
        response_index: key.index,
        selected,
        options,
    }))
}

/// PUT /api/v1/sessions/:session_id/feedback/selection
pub async fn handle_select_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectFeedbackRequest>,
) -> Result<Json<SelectFeedbackResponse>, AppError> {
    let key = FeedbackKey::new(request.topic, request.response_index);
    state
        .sessions
        .write(session_id, |s| s.select(key, request.choice))
        .await?;
    Ok(Json(SelectFeedbackResponse {
        selected: request.choice,
    }))
}

/// POST /api/v1/sessions/:session_id/feedback/finalize
///
/// Publishes the chosen option to the student. Later calls overwrite.
pub async fn handle_finalize_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<FinalizeFeedbackRequest>,
) -> Result<Json<FinalizedFeedback>, AppError> {
    let key = FeedbackKey::new(request.topic, request.response_index);
    let finalized = state
        .sessions
        .write(session_id, |s| s.finalize(key.clone(), request.choice))
        .await?;
    info!(
        "Session {session_id}: {} finalized for response {} of {:?}",
        finalized.choice.label(),
        key.index,
        key.topic
    );
    Ok(Json(finalized))
}

/// GET /api/v1/sessions/:session_id/feedback?topic=&response_index=
///
/// Student view: the finalized feedback for one response.
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<FinalizedFeedback>, AppError> {
    let key = FeedbackKey::new(query.topic, query.response_index);
    let finalized = state
        .sessions
        .read(session_id, |s| {
            s.response(&key)?;
            s.finalized(&key)
                .cloned()
                .ok_or_else(|| SessionError::NotFinalized {
                    topic: key.topic.clone(),
                    index: key.index,
                })
        })
        .await?;
    Ok(Json(finalized))
}
