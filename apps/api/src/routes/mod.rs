pub mod health;
pub mod stylesheet;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::feedback::handlers as feedback;
use crate::moderation::handlers as moderation;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/style.css", get(stylesheet::stylesheet_handler))
        .route("/api/v1/moderation/check", post(moderation::handle_check))
        // Sessions
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:session_id",
            delete(session::handle_close_session),
        )
        // Teacher: topics
        .route(
            "/api/v1/sessions/:session_id/topics",
            get(session::handle_list_topics).post(session::handle_add_topic),
        )
        // Student: responses
        .route(
            "/api/v1/sessions/:session_id/responses",
            get(session::handle_list_responses).post(session::handle_submit_response),
        )
        // Feedback
        .route(
            "/api/v1/sessions/:session_id/feedback",
            get(feedback::handle_get_feedback).post(feedback::handle_generate_feedback),
        )
        .route(
            "/api/v1/sessions/:session_id/feedback/selection",
            put(feedback::handle_select_feedback),
        )
        .route(
            "/api/v1/sessions/:session_id/feedback/finalize",
            post(feedback::handle_finalize_feedback),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::feedback::generator::tests::ScriptedModel;
    use crate::llm_client::{CompletionModel, LlmError};
    use crate::session::SessionStore;

    const TOPIC: &str = "Causes of WWI";
    const ANSWER: &str = "The war started because of alliances and nationalism.";

    const DRAFT_ONE: &str = "Strengths: You name two real causes of the war, alliances and nationalism, \
        which shows you know the basics.\nAreas for Improvement: Neither cause is explained, and there \
        is no link to the events of 1914 such as the assassination in Sarajevo.\nActionable Suggestions: \
        Pick one cause and explain step by step how it drew more countries into the conflict.";
    const DRAFT_TWO: &str = "Strengths: you correctly identify alliances and nationalism\n\
        Areas for Improvement: the answer stays very general\n\
        Actionable Suggestions: add one concrete example from 1914";

    fn test_config() -> Config {
        Config {
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            llm_timeout_secs: 5,
            default_word_limit: 100,
            stylesheet_path: "static/style.css".to_string(),
            blocklist_path: None,
            session_idle_secs: 3600,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app_with(model: impl CompletionModel + 'static) -> Router {
        build_router(AppState {
            sessions: SessionStore::new(Duration::from_secs(3600)),
            llm: Arc::new(model),
            config: test_config(),
            stylesheet: Arc::from(".feedback-box { padding: 15px; }"),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let response = send(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn session_with_answer(app: &Router) -> String {
        let id = new_session(app).await;
        let response = send(
            app,
            "POST",
            &format!("/api/v1/sessions/{id}/topics"),
            Some(json!({ "topic": TOPIC })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(
            app,
            "POST",
            &format!("/api/v1/sessions/{id}/responses"),
            Some(json!({ "topic": TOPIC, "text": ANSWER })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["response_index"], 0);
        id
    }

    fn feedback_query(id: &str) -> String {
        format!("/api/v1/sessions/{id}/feedback?topic=Causes%20of%20WWI&response_index=0")
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app_with(ScriptedModel::replying(&[]));
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_stylesheet_is_served_verbatim() {
        let app = app_with(ScriptedModel::replying(&[]));
        let response = send(&app, "GET", "/style.css", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/css; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b".feedback-box { padding: 15px; }");
    }

    #[tokio::test]
    async fn test_moderation_check_endpoint() {
        let app = app_with(ScriptedModel::replying(&[]));
        let response = send(
            &app,
            "POST",
            "/api/v1/moderation/check",
            Some(json!({ "text": "what a load of crap" })),
        )
        .await;
        assert_eq!(
            body_json(response).await,
            json!({ "flagged": true, "reason": "Contains inappropriate content." })
        );
    }

    #[tokio::test]
    async fn test_end_to_end_feedback_flow() {
        let app = app_with(ScriptedModel::replying(&[DRAFT_ONE, DRAFT_TWO]));
        let id = session_with_answer(&app).await;

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback"),
            Some(json!({ "topic": TOPIC, "response_index": 0, "word_limit": 50 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let generated = body_json(response).await;
        assert_eq!(generated["selected"], "option_1");

        let option_1 = &generated["options"]["option_1"];
        let option_2 = &generated["options"]["option_2"];
        assert!(option_1["text"].as_str().unwrap().split_whitespace().count() <= 50);
        assert!(option_2["text"].as_str().unwrap().split_whitespace().count() <= 50);
        assert!(option_1["rendered"]
            .as_str()
            .unwrap()
            .contains("Feedback Option 1"));
        let paragraph = option_2["rendered"].as_str().unwrap().to_string();
        assert!(paragraph.starts_with("Your response shows that"));

        // Nothing is visible to the student before finalization.
        let response = send(&app, "GET", &feedback_query(&id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/feedback/selection"),
            Some(json!({ "topic": TOPIC, "response_index": 0, "choice": "Feedback Option 2" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback/finalize"),
            Some(json!({ "topic": TOPIC, "response_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["choice"], "option_2");

        let response = send(&app, "GET", &feedback_query(&id), None).await;
        assert_eq!(body_json(response).await["text"], paragraph.as_str());

        // Finalizing again with Option 1 overwrites.
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback/finalize"),
            Some(json!({ "topic": TOPIC, "response_index": 0, "choice": "option_1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, "GET", &feedback_query(&id), None).await;
        assert_eq!(body_json(response).await["text"], option_1["rendered"]);

        let response = send(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/responses?topic=Causes%20of%20WWI"),
            None,
        )
        .await;
        let listing = body_json(response).await;
        assert_eq!(listing["responses"][0]["has_finalized_feedback"], true);
        assert_eq!(listing["responses"][0]["word_count"], 8);
    }

    #[tokio::test]
    async fn test_flagged_submission_is_rejected_and_not_stored() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = session_with_answer(&app).await;

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/responses"),
            Some(json!({ "topic": TOPIC, "text": "Who gives a shit about 1914" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "UNPROCESSABLE_ENTITY"
        );

        let response = send(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/responses?topic=Causes%20of%20WWI"),
            None,
        )
        .await;
        let listing = body_json(response).await;
        assert_eq!(listing["responses"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submission_is_a_validation_error() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = session_with_answer(&app).await;
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/responses"),
            Some(json!({ "topic": TOPIC, "text": "   " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_failure_stores_no_drafts() {
        let app = app_with(ScriptedModel::new(vec![
            Err(LlmError::Api {
                status: 500,
                message: "model crashed".to_string(),
            }),
            Ok("unused".to_string()),
        ]));
        let id = session_with_answer(&app).await;

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback"),
            Some(json!({ "topic": TOPIC, "response_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback/finalize"),
            Some(json!({ "topic": TOPIC, "response_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feedback_for_missing_response_is_not_found() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = session_with_answer(&app).await;
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/feedback"),
            Some(json!({ "topic": TOPIC, "response_index": 7 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_topic_conflicts() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = session_with_answer(&app).await;
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/topics"),
            Some(json!({ "topic": TOPIC })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(&app, "GET", &format!("/api/v1/sessions/{id}/topics"), None).await;
        assert_eq!(body_json(response).await, json!({ "topics": [TOPIC] }));
    }

    #[tokio::test]
    async fn test_padded_topic_name_accepts_submissions() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = new_session(&app).await;
        let padded = format!("  {TOPIC} ");
        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/topics"),
            Some(json!({ "topic": padded })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/responses"),
            Some(json!({ "topic": padded, "text": ANSWER })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["topic"], TOPIC);
        assert_eq!(body["response_index"], 0);
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let app = app_with(ScriptedModel::replying(&[]));
        let id = new_session(&app).await;

        let response = send(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", &format!("/api/v1/sessions/{id}/topics"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
