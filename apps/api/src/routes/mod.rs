pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Interview API: video frames arrive inline, so the body cap is configurable
    let interview = Router::new()
        .route(
            "/api/v1/interview/analyze-answer",
            post(handlers::handle_analyze_answer),
        )
        .route(
            "/api/v1/interview/facial-analysis",
            post(handlers::handle_facial_analysis),
        )
        .route(
            "/api/v1/interview/questions",
            post(handlers::handle_generate_questions),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(interview)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::analyzer::tests::test_state;
    use crate::llm_client::tests::ScriptedGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Thirty frames of 80 KB each, about 2.4 MB of JSON.
    fn webcam_capture() -> Vec<String> {
        (0..30)
            .map(|_| format!("data:image/jpeg;base64,{}", "A".repeat(80_000)))
            .collect()
    }

    fn router(reply: &str) -> Router {
        build_router(test_state(Arc::new(ScriptedGenerator::replying(reply))))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(router("SCORE: 5"), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "coach-api");
    }

    #[tokio::test]
    async fn test_analyze_answer_round_trip() {
        let (status, body) = send(
            router("SCORE: 7\nGOOD: Specific.\nIMPROVE: Shorter."),
            "POST",
            "/api/v1/interview/analyze-answer",
            Some(json!({
                "question": "Tell me about a hard bug.",
                "answer": "We shipped the release."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content_score"], 7);
        assert_eq!(body["good"], "Specific.");
        assert_eq!(body["emotion_data"]["dominant_emotion"], "neutral");
        assert!(body.get("service_error").is_none());
        assert!(body["score_breakdown"]["weights"]["content"].is_number());
    }

    #[tokio::test]
    async fn test_analyze_answer_rejects_empty_answer() {
        let (status, body) = send(
            router("SCORE: 7"),
            "POST",
            "/api/v1/interview/analyze-answer",
            Some(json!({"question": "Q?", "answer": ""})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "No answer provided");
    }

    #[tokio::test]
    async fn test_facial_analysis_requires_frames() {
        let (status, body) = send(
            router("SCORE: 5"),
            "POST",
            "/api/v1/interview/facial-analysis",
            Some(json!({"frames": []})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "no frames provided");
    }

    #[tokio::test]
    async fn test_facial_analysis_without_face_is_default() {
        let (status, body) = send(
            router("SCORE: 5"),
            "POST",
            "/api/v1/interview/facial-analysis",
            Some(json!({"frames": ["data:image/png;base64,AAAA"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detection_method"], "default");
        assert_eq!(body["frames_analyzed"], 0);
    }

    #[tokio::test]
    async fn test_facial_analysis_accepts_multi_megabyte_capture() {
        let (status, body) = send(
            router("SCORE: 5"),
            "POST",
            "/api/v1/interview/facial-analysis",
            Some(json!({"frames": webcam_capture()})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detection_method"], "default");
    }

    #[tokio::test]
    async fn test_analyze_answer_accepts_multi_megabyte_capture() {
        let (status, body) = send(
            router("SCORE: 6"),
            "POST",
            "/api/v1/interview/analyze-answer",
            Some(json!({
                "question": "Tell me about a hard bug.",
                "answer": "We shipped the release.",
                "video_frames": webcam_capture()
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content_score"], 6);
    }

    #[tokio::test]
    async fn test_body_over_configured_limit_is_rejected() {
        let mut state = test_state(Arc::new(ScriptedGenerator::replying("SCORE: 5")));
        state.config.max_body_bytes = 64 * 1024;

        let (status, _) = send(
            build_router(state),
            "POST",
            "/api/v1/interview/facial-analysis",
            Some(json!({"frames": webcam_capture()})),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_questions_endpoint() {
        let (status, body) = send(
            router("1. How did you tune Spark joins?\n2. Why Airflow over cron?"),
            "POST",
            "/api/v1/interview/questions",
            Some(json!({
                "name": "Asha",
                "field": "Data Engineering",
                "level": "Experienced",
                "skills": ["Spark", "Airflow"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "llm");
        assert_eq!(body["difficulty"], "advanced-level");
        assert_eq!(body["questions"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_questions_require_field() {
        let (status, _) = send(
            router("1. Q?"),
            "POST",
            "/api/v1/interview/questions",
            Some(json!({"field": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
