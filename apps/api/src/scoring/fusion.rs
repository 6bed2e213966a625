use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emotion::{Emotion, EmotionResult};
use crate::models::interview::InterviewState;
use crate::scoring::{round_to, FusionWeights};
use crate::sentiment::{OverallSentiment, SentimentResult};

/// Final 1–10 score with its per-signal breakdown, each rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedScore {
    pub final_score: f64,
    pub content_score: f64,
    pub sentiment_score: f64,
    pub emotion_score: f64,
    pub weights: FusionWeights,
}

/// Verbal-confidence signal in [0.2, 1].
pub fn sentiment_component(sentiment: &SentimentResult) -> f64 {
    let mut base = sentiment.confidence_score.max(0.3);

    base = match sentiment.emotional_state {
        InterviewState::Nervous => base * 0.7,
        InterviewState::Hesitant => base * 0.8,
        InterviewState::Confident => (base * 1.15).min(1.0),
        InterviewState::Calm => (base * 1.05).min(1.0),
        InterviewState::Neutral => base,
    };

    base = match sentiment.overall_sentiment {
        OverallSentiment::Negative => base * 0.6,
        OverallSentiment::Positive => (base * 1.1).min(1.0),
        OverallSentiment::Neutral => base,
    };

    if sentiment.nervousness_score > 0.7 {
        base *= 0.85;
    } else if sentiment.nervousness_score > 0.5 {
        base *= 0.9;
    }

    let score = base.clamp(0.2, 1.0);
    debug!(
        "Sentiment component: confidence={:.2} state={} sentiment={:?} -> {score:.3}",
        sentiment.confidence_score,
        sentiment.emotional_state.as_str(),
        sentiment.overall_sentiment
    );
    score
}

/// Facial-affect signal in [0, 1]. Precomputed metrics take precedence over the raw
/// distribution when present.
pub fn emotion_component(emotion: &EmotionResult) -> f64 {
    let e = &emotion.emotions;
    let negatives = Emotion::NEGATIVE.map(|label| e.get(label));
    let metrics = emotion.emotion_metrics.as_ref();

    let negative_sum = metrics.map_or_else(|| negatives.iter().sum(), |m| m.negative_sum);
    let negative_peak = metrics.map_or_else(
        || negatives.iter().copied().fold(0.0, f64::max),
        |m| m.negative_peak,
    );
    let sadness = metrics.map_or_else(|| e.get(Emotion::Sad), |m| m.sadness);
    let happy = metrics.map_or_else(|| e.get(Emotion::Happy), |m| m.positive);
    let neutral = metrics.map_or_else(|| e.get(Emotion::Neutral), |m| m.neutral);

    let mut score = if happy > 0.3 {
        0.6 + happy * 0.4
    } else if negative_sum > 0.25 || negative_peak > 0.15 {
        let mut s = (0.3 - negative_sum * 0.3).max(0.15);
        if negative_peak > 0.15 {
            s = (s - negative_peak * 0.8).max(0.15);
        }
        s
    } else if neutral > 0.6 {
        0.5 + neutral * 0.2
    } else {
        (0.5 + happy * 0.4 - negative_sum * 0.3).clamp(0.3, 1.0)
    };

    if sadness >= 0.2 {
        score *= 0.55;
    } else if sadness >= 0.15 {
        score *= 0.75;
    }

    if happy >= 0.35 && negative_sum < 0.2 {
        score = (score + 0.1).min(1.0);
    }

    score = match emotion.interview_state {
        InterviewState::Nervous => score * 0.75,
        InterviewState::Hesitant => score * 0.85,
        InterviewState::Confident => (score * 1.15).min(1.0),
        InterviewState::Calm => (score * 1.05).min(1.0),
        InterviewState::Neutral => score,
    };

    let score = score.clamp(0.0, 1.0);
    debug!(
        "Emotion component: happy={happy:.2} negative={negative_sum:.2} peak={negative_peak:.2} \
         state={} -> {score:.3}",
        emotion.interview_state.as_str()
    );
    score
}

/// Weighted blend of the normalized signals, scaled to 1–10.
pub fn fuse(content_score: u8, sentiment: f64, emotion: f64, weights: &FusionWeights) -> CombinedScore {
    let content = (content_score as f64 / 10.0).clamp(0.0, 1.0);
    let raw = content * weights.content + sentiment * weights.sentiment + emotion * weights.emotion;
    let final_score = round_to((raw * 10.0).clamp(1.0, 10.0), 1);

    debug!(
        "Final score {final_score:.1}/10 (content={content_score}, sentiment={:.1}, emotion={:.1})",
        sentiment * 10.0,
        emotion * 10.0
    );

    CombinedScore {
        final_score,
        content_score: (content_score as f64).clamp(1.0, 10.0),
        sentiment_score: round_to((sentiment * 10.0).clamp(1.0, 10.0), 1),
        emotion_score: round_to((emotion * 10.0).clamp(1.0, 10.0), 1),
        weights: *weights,
    }
}

pub fn combine_scores(
    content_score: u8,
    sentiment: &SentimentResult,
    emotion: &EmotionResult,
    weights: &FusionWeights,
) -> CombinedScore {
    fuse(
        content_score,
        sentiment_component(sentiment),
        emotion_component(emotion),
        weights,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{DetectionMethod, EmotionDistribution};

    fn sentiment(
        state: InterviewState,
        overall: OverallSentiment,
        confidence: f64,
        nervousness: f64,
    ) -> SentimentResult {
        SentimentResult {
            emotional_state: state,
            overall_sentiment: overall,
            confidence_score: confidence,
            nervousness_score: nervousness,
            ..SentimentResult::neutral_default()
        }
    }

    fn emotion(pairs: &[(Emotion, f64)]) -> EmotionResult {
        EmotionResult::from_distribution(
            EmotionDistribution::from_scores(pairs.iter().copied()),
            DetectionMethod::Heuristic,
            1,
        )
    }

    #[test]
    fn test_fuse_rounds_half_up() {
        let combined = fuse(8, 0.9, 0.8, &FusionWeights::default());
        assert_eq!(combined.final_score, 8.3);
        assert_eq!(combined.content_score, 8.0);
        assert_eq!(combined.sentiment_score, 9.0);
        assert_eq!(combined.emotion_score, 8.0);
    }

    #[test]
    fn test_fuse_is_idempotent() {
        let s = sentiment(InterviewState::Calm, OverallSentiment::Positive, 0.62, 0.2);
        let e = emotion(&[(Emotion::Happy, 0.4), (Emotion::Neutral, 0.6)]);
        let w = FusionWeights::default();
        assert_eq!(combine_scores(7, &s, &e, &w), combine_scores(7, &s, &e, &w));
    }

    #[test]
    fn test_final_score_floor_is_one() {
        let w = FusionWeights {
            content: 0.0,
            sentiment: 0.0,
            emotion: 1.0,
        };
        let combined = fuse(1, 0.2, 0.0, &w);
        assert_eq!(combined.final_score, 1.0);
        assert_eq!(combined.emotion_score, 1.0);
    }

    #[test]
    fn test_confident_positive_caps_at_one() {
        let s = sentiment(InterviewState::Confident, OverallSentiment::Positive, 0.9, 0.1);
        assert_eq!(sentiment_component(&s), 1.0);
    }

    #[test]
    fn test_nervous_negative_hits_floor() {
        let s = sentiment(InterviewState::Nervous, OverallSentiment::Negative, 0.2, 0.8);
        assert_eq!(sentiment_component(&s), 0.2);
    }

    #[test]
    fn test_hesitant_with_moderate_nervousness() {
        let s = sentiment(InterviewState::Hesitant, OverallSentiment::Neutral, 0.5, 0.6);
        assert!((sentiment_component(&s) - 0.36).abs() < 1e-12);
    }

    #[test]
    fn test_default_emotion_scores_neutral_baseline() {
        assert!((emotion_component(&EmotionResult::default()) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_happy_face_scores_full() {
        let e = emotion(&[(Emotion::Happy, 0.9), (Emotion::Neutral, 0.1)]);
        assert_eq!(e.interview_state, InterviewState::Confident);
        assert_eq!(emotion_component(&e), 1.0);
    }

    #[test]
    fn test_sad_face_heavily_penalized() {
        let e = emotion(&[(Emotion::Sad, 0.5), (Emotion::Neutral, 0.5)]);
        assert_eq!(e.interview_state, InterviewState::Nervous);
        let score = emotion_component(&e);
        assert!((score - 0.15 * 0.55 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_raw_distribution_used_without_metrics() {
        let mut e = emotion(&[(Emotion::Happy, 0.5), (Emotion::Neutral, 0.5)]);
        let with_metrics = emotion_component(&e);
        e.emotion_metrics = None;
        assert_eq!(emotion_component(&e), with_metrics);
    }

    #[test]
    fn test_mixed_case_is_clamped() {
        let e = EmotionResult {
            interview_state: InterviewState::Neutral,
            emotion_metrics: None,
            ..emotion(&[
                (Emotion::Neutral, 0.5),
                (Emotion::Happy, 0.2),
                (Emotion::Surprise, 0.2),
                (Emotion::Fear, 0.1),
            ])
        };
        // 0.5 + 0.2·0.4 − 0.1·0.3
        assert!((emotion_component(&e) - 0.55).abs() < 1e-12);
    }
}
