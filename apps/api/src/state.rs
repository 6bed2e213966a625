use std::sync::Arc;

use crate::config::Config;
use crate::emotion::FacialEmotionScorer;
use crate::llm_client::{RetryPolicy, TextGenerator};
use crate::sentiment::TextSentimentScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Content judge. `LlmClient` in production, a scripted double in tests.
    pub llm: Arc<dyn TextGenerator>,
    pub retry: RetryPolicy,
    pub sentiment: Arc<TextSentimentScorer>,
    /// Shared across blocking tasks; every frame analysis borrows it immutably.
    pub facial: Arc<FacialEmotionScorer>,
    pub config: Config,
}
