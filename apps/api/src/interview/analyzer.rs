use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::emotion::{EmotionResult, FacialEmotionScorer};
use crate::errors::AppError;
use crate::interview::content_feedback::{parse_content_feedback, ContentFeedback};
use crate::interview::prompts::{ANSWER_REVIEW_PROMPT_TEMPLATE, ANSWER_REVIEW_SYSTEM};
use crate::interview::questions::difficulty_for;
use crate::llm_client::prompts::{fill, PLAIN_TEXT_INSTRUCTION};
use crate::llm_client::{generate_text, LlmError, RetryPolicy, TextGenerator};
use crate::scoring::{combine_scores, CombinedScore, FusionWeights};
use crate::sentiment::SentimentResult;
use crate::state::AppState;

/// Error code attached to an analysis whose content judgement fell back to defaults.
pub const LLM_UNAVAILABLE: &str = "LLM_UNAVAILABLE";

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeAnswerRequest {
    #[serde(default)]
    pub question: String,
    pub answer: String,
    #[serde(default = "default_field")]
    pub field: String,
    #[serde(default = "default_level")]
    pub level: String,
    /// Base64 / data-URL encoded frames captured while the candidate answered.
    #[serde(default)]
    pub video_frames: Vec<String>,
    /// Overrides the configured fusion weights for this request.
    #[serde(default)]
    pub weights: Option<FusionWeights>,
}

fn default_field() -> String {
    "General".to_string()
}

fn default_level() -> String {
    "Intermediate".to_string()
}

/// Classified failure of an external service that the analysis recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerAnalysis {
    pub success: bool,
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub score: f64,
    pub content_score: u8,
    pub sentiment_score: f64,
    pub emotion_score: f64,
    pub good: String,
    pub improve: String,
    pub sentiment_data: SentimentResult,
    pub emotion_data: EmotionResult,
    pub score_breakdown: CombinedScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_error: Option<ServiceError>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub fn build_review_prompt(request: &AnalyzeAnswerRequest) -> String {
    fill(
        ANSWER_REVIEW_PROMPT_TEMPLATE,
        &[
            ("field", &request.field),
            ("level", &request.level),
            ("difficulty", difficulty_for(&request.level)),
            ("question", &request.question),
            ("answer", request.answer.trim()),
            ("plain_text_instruction", PLAIN_TEXT_INSTRUCTION),
        ],
    )
}

/// Content judgement for one answer. The error is returned only once retries are spent.
pub async fn review_content(
    llm: &dyn TextGenerator,
    policy: &RetryPolicy,
    request: &AnalyzeAnswerRequest,
) -> Result<ContentFeedback, LlmError> {
    let prompt = build_review_prompt(request);
    let text = generate_text(llm, policy, &prompt, ANSWER_REVIEW_SYSTEM).await?;
    Ok(parse_content_feedback(&text))
}

/// Runs facial analysis on tokio's blocking pool.
pub async fn analyze_frames_blocking(
    scorer: Arc<FacialEmotionScorer>,
    frames: Vec<String>,
) -> Result<EmotionResult, AppError> {
    tokio::task::spawn_blocking(move || scorer.analyze_frames(&frames))
        .await
        .map_err(|e| AppError::Internal(anyhow!("facial analysis task failed: {e}")))
}

/// Scores one answer on content, verbal confidence and facial affect.
///
/// An unreachable LLM does not fail the request: content falls back to the neutral
/// default and the response carries a `service_error`.
pub async fn analyze_answer(
    state: &AppState,
    request: AnalyzeAnswerRequest,
) -> Result<AnswerAnalysis, AppError> {
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("No answer provided".to_string()));
    }

    let weights = request.weights.unwrap_or(state.config.weights);
    weights.validate()?;

    let sentiment = state.sentiment.analyze(&request.answer);

    let frames = request.video_frames.clone();
    let (emotion, content) = tokio::join!(
        analyze_frames_blocking(state.facial.clone(), frames),
        review_content(state.llm.as_ref(), &state.retry, &request),
    );
    let emotion = emotion?;

    let (feedback, service_error) = match content {
        Ok(feedback) => (feedback, None),
        Err(e) => {
            warn!("Content review unavailable, using default feedback: {e}");
            (
                ContentFeedback::default(),
                Some(ServiceError {
                    code: LLM_UNAVAILABLE.to_string(),
                    message: e.to_string(),
                }),
            )
        }
    };

    let breakdown = combine_scores(feedback.score, &sentiment, &emotion, &weights);

    info!(
        "Answer scored {:.1}/10 (content={}, sentiment={:.1}, emotion={:.1}, frames={}/{})",
        breakdown.final_score,
        feedback.score,
        breakdown.sentiment_score,
        breakdown.emotion_score,
        emotion.frames_analyzed,
        request.video_frames.len()
    );

    Ok(AnswerAnalysis {
        success: true,
        analysis_id: Uuid::new_v4(),
        analyzed_at: Utc::now(),
        score: breakdown.final_score,
        content_score: feedback.score,
        sentiment_score: breakdown.sentiment_score,
        emotion_score: breakdown.emotion_score,
        good: feedback.good,
        improve: feedback.improve,
        sentiment_data: sentiment,
        emotion_data: emotion,
        score_breakdown: breakdown,
        service_error,
    })
}
