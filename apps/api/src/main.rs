mod config;
mod emotion;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod sentiment;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::emotion::face::{FaceDetector, NoFaceDetector, SeetaFaceDetector};
use crate::emotion::ferplus::LazyFerPlusClassifier;
use crate::emotion::model_store::ModelStore;
use crate::emotion::{EmotionClassifier, FacialEmotionScorer};
use crate::llm_client::{LlmClient, RetryPolicy};
use crate::routes::build_router;
use crate::sentiment::TextSentimentScorer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    );
    let retry = RetryPolicy {
        max_attempts: config.llm_max_attempts,
        backoff: Duration::from_millis(config.llm_backoff_ms),
    };
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm_client::MODEL,
        retry.max_attempts
    );

    // Initialize text sentiment scorer
    let sentiment = TextSentimentScorer::with_default_estimators()?;

    // Initialize facial emotion scorer
    let facial = FacialEmotionScorer::new(build_face_detector(&config), build_classifiers(&config));

    info!(
        "Fusion weights: content={} sentiment={} emotion={}",
        config.weights.content, config.weights.sentiment, config.weights.emotion
    );

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        retry,
        sentiment: Arc::new(sentiment),
        facial: Arc::new(facial),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// SeetaFace detector from `FACE_MODEL_PATH`. Without a usable model no frame yields a
/// face and facial analysis always reports the neutral default.
fn build_face_detector(config: &Config) -> Arc<dyn FaceDetector> {
    let Some(path) = &config.face_model_path else {
        warn!("FACE_MODEL_PATH not set; facial analysis will return defaults");
        return Arc::new(NoFaceDetector);
    };

    match SeetaFaceDetector::from_file(path) {
        Ok(detector) => {
            info!("Face detector loaded from {}", path.display());
            Arc::new(detector)
        }
        Err(e) => {
            warn!("Face detector unavailable ({e}); facial analysis will return defaults");
            Arc::new(NoFaceDetector)
        }
    }
}

/// Model-based classifiers, best first. The heuristic classifier is always appended by
/// `FacialEmotionScorer::new`.
fn build_classifiers(config: &Config) -> Vec<Arc<dyn EmotionClassifier>> {
    if !config.emotion_model_enabled {
        info!("Emotion model disabled; using heuristic classifier");
        return Vec::new();
    }
    if !cfg!(feature = "fer-model") {
        info!("Built without the fer-model feature; using heuristic classifier");
        return Vec::new();
    }

    let store = match &config.emotion_model_dir {
        Some(dir) => ModelStore::with_cache_dir(dir.clone()),
        None => match ModelStore::new() {
            Ok(store) => store,
            Err(e) => {
                warn!("Emotion model cache unavailable ({e}); using heuristic classifier");
                return Vec::new();
            }
        },
    };
    info!("Emotion model cache: {}", store.cache_dir().display());

    vec![Arc::new(LazyFerPlusClassifier::from_store(store))]
}
