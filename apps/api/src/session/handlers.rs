//! Axum route handlers for sessions, topics and student responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::moderation;
use crate::session::{ResponseSummary, SessionError};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddTopicRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct ResponsesResponse {
    pub topic: String,
    pub responses: Vec<ResponseSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    pub topic: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponseResponse {
    pub topic: String,
    pub response_index: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let (session_id, created_at) = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            created_at,
        }),
    )
}

/// DELETE /api/v1/sessions/:session_id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:session_id/topics
pub async fn handle_list_topics(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TopicsResponse>, AppError> {
    let topics = state
        .sessions
        .read(session_id, |s| Ok(s.topics().to_vec()))
        .await?;
    Ok(Json(TopicsResponse { topics }))
}

/// POST /api/v1/sessions/:session_id/topics
pub async fn handle_add_topic(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AddTopicRequest>,
) -> Result<(StatusCode, Json<TopicsResponse>), AppError> {
    let topics = state
        .sessions
        .write(session_id, |s| {
            s.add_topic(&request.topic)?;
            Ok(s.topics().to_vec())
        })
        .await?;
    info!("Session {session_id}: topic added ({} total)", topics.len());
    Ok((StatusCode::CREATED, Json(TopicsResponse { topics })))
}

/// GET /api/v1/sessions/:session_id/responses?topic=
pub async fn handle_list_responses(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<ResponsesResponse>, AppError> {
    let responses = state
        .sessions
        .read(session_id, |s| s.response_summaries(&query.topic))
        .await?;
    Ok(Json(ResponsesResponse {
        topic: query.topic.trim().to_string(),
        responses,
    }))
}

/// POST /api/v1/sessions/:session_id/responses
///
/// Blank text is rejected first, then moderation runs, then the response is stored.
pub async fn handle_submit_response(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitResponseRequest>,
) -> Result<(StatusCode, Json<SubmitResponseResponse>), AppError> {
    let result = state
        .sessions
        .write(session_id, |s| {
            s.submit_response(&request.topic, &request.text, moderation::check)
        })
        .await;

    if let Err(SessionError::Flagged { .. }) = &result {
        warn!("Session {session_id}: submission for {:?} flagged by moderation", request.topic);
    }
    let response_index = result?;

    info!(
        "Session {session_id}: response {response_index} stored for {:?}",
        request.topic
    );
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponseResponse {
            topic: request.topic.trim().to_string(),
            response_index,
        }),
    ))
}
