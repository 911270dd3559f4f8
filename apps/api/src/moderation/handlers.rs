use axum::Json;
use serde::Deserialize;

use crate::moderation::{self, ModerationVerdict};

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub text: String,
}

/// POST /api/v1/moderation/check
///
/// Dry-run of the submission check. Nothing is stored.
pub async fn handle_check(Json(request): Json<ModerationRequest>) -> Json<ModerationVerdict> {
    Json(moderation::check(&request.text))
}
