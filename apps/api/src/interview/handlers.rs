//! Axum route handlers for the Interview API.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::emotion::EmotionResult;
use crate::errors::AppError;
use crate::interview::analyzer::{
    analyze_answer, analyze_frames_blocking, AnalyzeAnswerRequest, AnswerAnalysis,
};
use crate::interview::questions::{generate_questions, QuestionRequest, QuestionSet};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FacialAnalysisRequest {
    #[serde(default)]
    pub frames: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interview/analyze-answer
///
/// Scores an answer on content (LLM), verbal confidence (text sentiment) and
/// facial affect (video frames), and fuses them into one 1–10 score.
pub async fn handle_analyze_answer(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeAnswerRequest>,
) -> Result<Json<AnswerAnalysis>, AppError> {
    let analysis = analyze_answer(&state, request).await?;
    Ok(Json(analysis))
}

/// POST /api/v1/interview/facial-analysis
///
/// Frame-only emotion analysis, aggregated over every frame with a detectable face.
pub async fn handle_facial_analysis(
    State(state): State<AppState>,
    Json(request): Json<FacialAnalysisRequest>,
) -> Result<Json<EmotionResult>, AppError> {
    if request.frames.is_empty() {
        return Err(AppError::Validation("no frames provided".to_string()));
    }

    let frame_count = request.frames.len();
    let result = analyze_frames_blocking(state.facial.clone(), request.frames).await?;
    info!(
        "Facial analysis: {} ({:?}) over {}/{} frames",
        result.dominant_emotion.as_str(),
        result.detection_method,
        result.frames_analyzed,
        frame_count
    );

    Ok(Json(result))
}

/// POST /api/v1/interview/questions
///
/// Generates personalized interview questions from the candidate's profile, topped up
/// with fallback questions when the LLM cannot provide enough.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<QuestionSet>, AppError> {
    if request.field.trim().is_empty() {
        return Err(AppError::Validation("field cannot be empty".to_string()));
    }

    let set = generate_questions(
        state.llm.as_ref(),
        &state.retry,
        &request,
        state.config.num_questions,
    )
    .await;

    Ok(Json(set))
}
