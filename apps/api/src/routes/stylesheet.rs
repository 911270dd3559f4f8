use axum::{extract::State, http::header, response::IntoResponse};

use crate::state::AppState;

/// GET /style.css
/// Serves the stylesheet loaded at startup, unparsed.
pub async fn stylesheet_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        state.stylesheet.to_string(),
    )
}
