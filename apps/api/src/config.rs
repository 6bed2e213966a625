use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::scoring::FusionWeights;

const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    pub llm_max_attempts: u32,
    pub llm_backoff_ms: u64,
    pub num_questions: usize,
    /// Request body cap for the interview routes; frames arrive inline as base64.
    pub max_body_bytes: usize,
    /// SeetaFace frontal model. Unset means frames never yield a face.
    pub face_model_path: Option<PathBuf>,
    pub emotion_model_dir: Option<PathBuf>,
    pub emotion_model_enabled: bool,
    pub weights: FusionWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = FusionWeights::default();
        let weights = FusionWeights {
            content: parse_env("SCORE_WEIGHT_CONTENT", defaults.content)?,
            sentiment: parse_env("SCORE_WEIGHT_SENTIMENT", defaults.sentiment)?,
            emotion: parse_env("SCORE_WEIGHT_EMOTION", defaults.emotion)?,
        };
        weights
            .validate()
            .context("SCORE_WEIGHT_* must be non-negative and sum to 1")?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            llm_max_attempts: parse_env::<u32>("LLM_MAX_ATTEMPTS", 3)?.max(1),
            llm_backoff_ms: parse_env("LLM_BACKOFF_MS", 1000)?,
            num_questions: parse_env::<usize>("NUM_QUESTIONS", 2)?.max(1),
            max_body_bytes: parse_env("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            face_model_path: std::env::var("FACE_MODEL_PATH").ok().map(PathBuf::from),
            emotion_model_dir: std::env::var("EMOTION_MODEL_DIR").ok().map(PathBuf::from),
            emotion_model_enabled: parse_env("EMOTION_MODEL_ENABLED", true)?,
            weights,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
