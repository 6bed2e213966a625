//! Text sentiment: verbal confidence, nervousness and hesitation signals derived
//! from an answer transcript.
//!
//! Estimators are ranked: the first one that answers is used, and a failing
//! estimator is treated as absent rather than as an error.

pub mod estimators;
pub mod lexicon;

use std::collections::HashSet;
use std::sync::Arc;

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::interview::InterviewState;
use crate::scoring::round_to;
use crate::sentiment::estimators::{
    CompoundEstimator, CompoundScores, PatternPolarityEstimator, PolarityEstimator,
    PolarityScores, ValenceLexiconEstimator,
};
use crate::sentiment::lexicon::{DISTRESS_TERMS, HESITATION_PATTERNS, NERVOUSNESS_TERMS};

#[derive(Debug, Error)]
pub enum SentimentSetupError {
    #[error("failed to build lexicon matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),

    #[error("invalid hesitation pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallSentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub overall_sentiment: OverallSentiment,
    pub confidence_score: f64,
    pub nervousness_score: f64,
    pub hesitation_score: f64,
    pub clarity_score: f64,
    pub tone_scores: ToneScores,
    pub emotional_state: InterviewState,
    /// Output of the compound estimator, 0 when none answered.
    pub vader_compound: f64,
    /// Output of the polarity estimator, 0 when none answered.
    pub textblob_polarity: f64,
}

impl SentimentResult {
    /// Result for an empty transcript.
    pub fn neutral_default() -> Self {
        Self {
            overall_sentiment: OverallSentiment::Neutral,
            confidence_score: 0.5,
            nervousness_score: 0.5,
            hesitation_score: 0.5,
            clarity_score: 0.5,
            tone_scores: ToneScores {
                positive: 0.33,
                neutral: 0.34,
                negative: 0.33,
            },
            emotional_state: InterviewState::Neutral,
            vader_compound: 0.0,
            textblob_polarity: 0.0,
        }
    }
}

pub struct TextSentimentScorer {
    compound: Vec<Arc<dyn CompoundEstimator>>,
    polarity: Vec<Arc<dyn PolarityEstimator>>,
    nervousness: AhoCorasick,
    distress: AhoCorasick,
    hesitation: Vec<Regex>,
}

impl TextSentimentScorer {
    pub fn new(
        compound: Vec<Arc<dyn CompoundEstimator>>,
        polarity: Vec<Arc<dyn PolarityEstimator>>,
    ) -> Result<Self, SentimentSetupError> {
        let hesitation = HESITATION_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            compound,
            polarity,
            nervousness: AhoCorasick::new(NERVOUSNESS_TERMS)?,
            distress: AhoCorasick::new(DISTRESS_TERMS)?,
            hesitation,
        })
    }

    /// Scorer wired with the built-in lexicon estimators.
    pub fn with_default_estimators() -> Result<Self, SentimentSetupError> {
        Self::new(
            vec![Arc::new(ValenceLexiconEstimator::new())],
            vec![Arc::new(PatternPolarityEstimator::new())],
        )
    }

    pub fn analyze(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral_default();
        }

        let lower = text.to_lowercase();
        let word_count = text.split_whitespace().count() as f64;

        let compound = self.first_compound(text);
        let polarity = self.first_polarity(text);

        let filler_terms = distinct_terms(&self.nervousness, &lower);
        let mut nervousness = (filler_terms as f64 / (word_count / 50.0).max(1.0)).min(1.0);
        let distress_terms = distinct_terms(&self.distress, &lower);
        if distress_terms > 0 {
            nervousness = (nervousness + 0.2 * distress_terms as f64).min(1.0);
        }

        let hesitation_hits: usize = self
            .hesitation
            .iter()
            .map(|re| re.find_iter(&lower).count())
            .sum();
        let hesitation = (hesitation_hits as f64 / (word_count / 30.0).max(1.0)).min(1.0);

        let clarity = clarity_score(text);
        let overall = classify_overall(compound.as_ref(), polarity.as_ref());

        let mut confidence = (1.0 - (nervousness * 0.6 + hesitation * 0.4)).max(0.0);
        if overall == OverallSentiment::Negative {
            confidence *= 0.5;
        }

        let emotional_state = classify_state(overall, nervousness, hesitation, confidence);

        let tone_scores = match &compound {
            Some(c) => ToneScores {
                positive: round_to(c.positive, 2),
                neutral: round_to(c.neutral, 2),
                negative: round_to(c.negative, 2),
            },
            None => ToneScores {
                positive: 0.5,
                neutral: 0.5,
                negative: 0.0,
            },
        };

        debug!(
            "Sentiment: overall={overall:?} nervousness={nervousness:.2} hesitation={hesitation:.2} \
             confidence={confidence:.2} state={}",
            emotional_state.as_str()
        );

        SentimentResult {
            overall_sentiment: overall,
            confidence_score: round_to(confidence, 2),
            nervousness_score: round_to(nervousness, 2),
            hesitation_score: round_to(hesitation, 2),
            clarity_score: round_to(clarity, 2),
            tone_scores,
            emotional_state,
            vader_compound: compound.map_or(0.0, |c| round_to(c.compound.clamp(-1.0, 1.0), 2)),
            textblob_polarity: polarity
                .map_or(0.0, |p| round_to(p.polarity.clamp(-1.0, 1.0), 2)),
        }
    }

    fn first_compound(&self, text: &str) -> Option<CompoundScores> {
        self.compound
            .iter()
            .find_map(|est| match est.estimate(text) {
                Ok(scores) => Some(scores),
                Err(e) => {
                    debug!("Compound estimator {} skipped: {e}", est.name());
                    None
                }
            })
    }

    fn first_polarity(&self, text: &str) -> Option<PolarityScores> {
        self.polarity
            .iter()
            .find_map(|est| match est.estimate(text) {
                Ok(scores) => Some(scores),
                Err(e) => {
                    debug!("Polarity estimator {} skipped: {e}", est.name());
                    None
                }
            })
    }
}

/// Number of distinct lexicon terms occurring anywhere in `haystack`.
fn distinct_terms(matcher: &AhoCorasick, haystack: &str) -> usize {
    matcher
        .find_overlapping_iter(haystack)
        .map(|m| m.pattern())
        .collect::<HashSet<_>>()
        .len()
}

/// Peaks at 1.0 for an average of 15 words per sentence.
fn clarity_score(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.split_whitespace().count())
        .collect();
    let avg = lengths.iter().sum::<usize>() as f64 / lengths.len().max(1) as f64;
    (1.0 - (avg - 15.0).abs() / 15.0).clamp(0.0, 1.0)
}

fn classify_overall(
    compound: Option<&CompoundScores>,
    polarity: Option<&PolarityScores>,
) -> OverallSentiment {
    match (compound, polarity) {
        (Some(c), _) if c.compound >= 0.05 => OverallSentiment::Positive,
        (Some(c), _) if c.compound <= -0.05 => OverallSentiment::Negative,
        (Some(_), _) => OverallSentiment::Neutral,
        (None, Some(p)) if p.polarity > 0.1 => OverallSentiment::Positive,
        (None, Some(p)) if p.polarity < -0.1 => OverallSentiment::Negative,
        _ => OverallSentiment::Neutral,
    }
}

fn classify_state(
    overall: OverallSentiment,
    nervousness: f64,
    hesitation: f64,
    confidence: f64,
) -> InterviewState {
    if overall == OverallSentiment::Negative || nervousness >= 0.4 || hesitation >= 0.4 {
        InterviewState::Nervous
    } else if confidence >= 0.7 && nervousness < 0.3 {
        InterviewState::Confident
    } else if hesitation >= 0.3 {
        InterviewState::Hesitant
    } else {
        InterviewState::Calm
    }
}
