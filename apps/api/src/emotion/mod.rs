//! Facial emotion: per-frame face detection and emotion classification, and the
//! aggregation of frames into a single interview-state reading.

pub mod decode;
pub mod face;
pub mod ferplus;
pub mod heuristic;
pub mod model_store;
pub mod scorer;

use std::collections::BTreeMap;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::models::interview::InterviewState;
use crate::scoring::round_to;

pub use scorer::FacialEmotionScorer;

/// Distributions whose total is this close to 1 are left untouched by normalization.
const NORMALIZED_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprise,
    ];

    pub const NEGATIVE: [Emotion; 4] = [Emotion::Sad, Emotion::Fear, Emotion::Angry, Emotion::Disgust];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
        }
    }

    pub fn is_negative(&self) -> bool {
        Self::NEGATIVE.contains(self)
    }
}

/// Emotion label → probability. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionDistribution(BTreeMap<Emotion, f64>);

impl EmotionDistribution {
    pub fn neutral() -> Self {
        Self(BTreeMap::from([(Emotion::Neutral, 1.0)]))
    }

    /// Raw, possibly unnormalized scores.
    pub fn from_scores(scores: impl IntoIterator<Item = (Emotion, f64)>) -> Self {
        Self(scores.into_iter().collect())
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0.get(&emotion).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        self.0.iter().map(|(e, p)| (*e, *p))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Clamps negative and non-finite scores to 0 and rescales to sum to 1.
    /// An all-zero distribution becomes `{neutral: 1}`.
    pub fn normalized(self) -> Self {
        let clamped = Self(
            self.0
                .into_iter()
                .map(|(e, p)| (e, if p.is_finite() && p > 0.0 { p } else { 0.0 }))
                .collect(),
        );
        let total = clamped.total();

        if total <= 0.0 {
            return Self::neutral();
        }
        if (total - 1.0).abs() <= NORMALIZED_TOLERANCE {
            return clamped;
        }
        Self(clamped.0.into_iter().map(|(e, p)| (e, p / total)).collect())
    }

    /// Arg-max label and its probability. Ties go to the first label in label order.
    pub fn dominant(&self) -> (Emotion, f64) {
        let mut best = (Emotion::Neutral, f64::NEG_INFINITY);
        for (emotion, p) in self.iter() {
            if p > best.1 {
                best = (emotion, p);
            }
        }
        if best.1.is_finite() {
            best
        } else {
            (Emotion::Neutral, 0.0)
        }
    }

    /// Per-label arithmetic mean over all seven labels, renormalized.
    /// `None` for an empty input.
    pub fn mean<'a>(distributions: impl IntoIterator<Item = &'a EmotionDistribution>) -> Option<Self> {
        let mut sums = [0.0_f64; 7];
        let mut count = 0usize;
        for dist in distributions {
            for (slot, emotion) in sums.iter_mut().zip(Emotion::ALL) {
                *slot += dist.get(emotion);
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Self::from_scores(Emotion::ALL.into_iter().zip(sums.map(|s| s / n))).normalized())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.6 {
            ConfidenceLevel::High
        } else if p >= 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// How a distribution was produced. Ordered from weakest to strongest source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Default,
    Heuristic,
    FerPlus,
}

/// Aggregates derived from a distribution, each rounded to 3 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionMetrics {
    pub negative_sum: f64,
    pub negative_peak: f64,
    pub positive: f64,
    pub neutral: f64,
    pub surprise: f64,
    pub sadness: f64,
    pub fear: f64,
    pub angry: f64,
    pub disgust: f64,
    pub balance: f64,
    pub calm_margin: f64,
}

impl EmotionMetrics {
    pub fn from_distribution(dist: &EmotionDistribution) -> Self {
        let negatives = Emotion::NEGATIVE.map(|e| dist.get(e));
        let negative_sum: f64 = negatives.iter().sum();
        let negative_peak = negatives.iter().copied().fold(0.0, f64::max);
        let positive = dist.get(Emotion::Happy);
        let neutral = dist.get(Emotion::Neutral);

        Self {
            negative_sum: round_to(negative_sum, 3),
            negative_peak: round_to(negative_peak, 3),
            positive: round_to(positive, 3),
            neutral: round_to(neutral, 3),
            surprise: round_to(dist.get(Emotion::Surprise), 3),
            sadness: round_to(dist.get(Emotion::Sad), 3),
            fear: round_to(dist.get(Emotion::Fear), 3),
            angry: round_to(dist.get(Emotion::Angry), 3),
            disgust: round_to(dist.get(Emotion::Disgust), 3),
            balance: round_to(positive - negative_sum, 3),
            calm_margin: round_to(neutral - negative_sum, 3),
        }
    }
}

/// First matching rule wins; the dominant label decides when no threshold fires.
pub fn map_to_state(dominant: Emotion, m: &EmotionMetrics) -> InterviewState {
    if m.sadness >= 0.2 || m.negative_peak >= 0.25 || m.negative_sum >= 0.45 {
        InterviewState::Nervous
    } else if m.negative_sum >= 0.3 || m.surprise >= 0.25 {
        InterviewState::Hesitant
    } else if m.positive >= 0.28 && m.negative_sum < 0.2 {
        InterviewState::Confident
    } else if m.neutral >= 0.65 && m.negative_sum < 0.2 {
        InterviewState::Calm
    } else if dominant.is_negative() {
        InterviewState::Nervous
    } else if dominant == Emotion::Happy {
        InterviewState::Confident
    } else if dominant == Emotion::Surprise {
        InterviewState::Hesitant
    } else {
        InterviewState::Calm
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotions: EmotionDistribution,
    pub dominant_emotion: Emotion,
    pub confidence_level: ConfidenceLevel,
    pub interview_state: InterviewState,
    pub max_confidence: f64,
    #[serde(default)]
    pub emotion_metrics: Option<EmotionMetrics>,
    pub detection_method: DetectionMethod,
    #[serde(default)]
    pub frames_analyzed: usize,
}

impl Default for EmotionResult {
    fn default() -> Self {
        let emotions = EmotionDistribution::neutral();
        Self {
            emotion_metrics: Some(EmotionMetrics::from_distribution(&emotions)),
            emotions,
            dominant_emotion: Emotion::Neutral,
            confidence_level: ConfidenceLevel::Low,
            interview_state: InterviewState::Neutral,
            max_confidence: 1.0,
            detection_method: DetectionMethod::Default,
            frames_analyzed: 0,
        }
    }
}

impl EmotionResult {
    pub fn from_distribution(
        distribution: EmotionDistribution,
        method: DetectionMethod,
        frames_analyzed: usize,
    ) -> Self {
        let emotions = distribution.normalized();
        let (dominant, max_confidence) = emotions.dominant();
        let metrics = EmotionMetrics::from_distribution(&emotions);

        Self {
            interview_state: map_to_state(dominant, &metrics),
            confidence_level: ConfidenceLevel::from_probability(max_confidence),
            max_confidence: round_to(max_confidence, 2),
            emotion_metrics: Some(metrics),
            emotions,
            dominant_emotion: dominant,
            detection_method: method,
            frames_analyzed,
        }
    }
}

/// A ranked emotion backend. `None` means "could not classify this face".
pub trait EmotionClassifier: Send + Sync {
    fn method(&self) -> DetectionMethod;
    fn classify(&self, face: &GrayImage) -> Option<EmotionDistribution>;
}
