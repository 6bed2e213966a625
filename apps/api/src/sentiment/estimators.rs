//! Polarity estimators: swappable backends behind the text sentiment scorer.
//!
//! Two capabilities are modelled separately because the scorer consumes them
//! differently: a *compound* estimator (a single [-1, 1] valence plus a
//! positive/neutral/negative breakdown) and a *polarity* estimator (polarity in
//! [-1, 1] plus subjectivity in [0, 1]). Both built-ins are lexicon based and need
//! no model files.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sentiment::lexicon::{BOOSTERS, INTENSIFIERS, NEGATIONS, POLARITY, VALENCE};

/// Valence multiplier applied when a negation precedes a sentiment word.
const NEGATION_SCALAR: f64 = -0.74;
/// Normalization constant for the compound score: s / sqrt(s² + ALPHA).
const ALPHA: f64 = 15.0;
/// Per-`!` emphasis, capped at four marks.
const EXCLAMATION_BOOST: f64 = 0.292;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("{estimator} is unavailable: {reason}")]
    Unavailable {
        estimator: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompoundScores {
    pub compound: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub polarity: f64,
    pub subjectivity: f64,
}

pub trait CompoundEstimator: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate(&self, text: &str) -> Result<CompoundScores, EstimatorError>;
}

pub trait PolarityEstimator: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate(&self, text: &str) -> Result<PolarityScores, EstimatorError>;
}

/// Lower-cased word tokens; apostrophes inside words are kept ("can't").
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// ValenceLexiconEstimator
// ────────────────────────────────────────────────────────────────────────────

pub struct ValenceLexiconEstimator {
    valence: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl ValenceLexiconEstimator {
    pub fn new() -> Self {
        Self {
            valence: VALENCE.iter().copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    fn word_valence(&self, tokens: &[String], i: usize) -> f64 {
        let Some(&base) = self.valence.get(tokens[i].as_str()) else {
            return 0.0;
        };

        let mut valence = base;
        for (distance, decay) in [(1, 1.0), (2, 0.95), (3, 0.9)] {
            if i < distance {
                break;
            }
            if let Some(&boost) = self.boosters.get(tokens[i - distance].as_str()) {
                let directed = if valence > 0.0 { boost } else { -boost };
                valence += directed * decay;
            }
        }

        let negated = (1..=3)
            .filter(|&d| i >= d)
            .any(|d| self.negations.contains(tokens[i - d].as_str()));
        if negated {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

impl Default for ValenceLexiconEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CompoundEstimator for ValenceLexiconEstimator {
    fn name(&self) -> &'static str {
        "valence-lexicon"
    }

    fn estimate(&self, text: &str) -> Result<CompoundScores, EstimatorError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(CompoundScores {
                compound: 0.0,
                positive: 0.0,
                neutral: 1.0,
                negative: 0.0,
            });
        }

        let valences: Vec<f64> = (0..tokens.len())
            .map(|i| self.word_valence(&tokens, i))
            .collect();

        let mut sum: f64 = valences.iter().sum();
        let emphasis = text.matches('!').count().min(4) as f64 * EXCLAMATION_BOOST;
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }
        let compound = (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0);
        if !compound.is_finite() {
            return Err(EstimatorError::Unavailable {
                estimator: self.name(),
                reason: format!("valence sum {sum} has no compound score"),
            });
        }

        let (mut pos, mut neg, mut neu) = (0.0_f64, 0.0_f64, 0.0_f64);
        for v in &valences {
            if *v > 0.0 {
                pos += v + 1.0;
            } else if *v < 0.0 {
                neg += v - 1.0;
            } else {
                neu += 1.0;
            }
        }
        let total = pos + neg.abs() + neu;

        Ok(CompoundScores {
            compound,
            positive: pos / total,
            neutral: neu / total,
            negative: neg.abs() / total,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PatternPolarityEstimator
// ────────────────────────────────────────────────────────────────────────────

pub struct PatternPolarityEstimator {
    lexicon: HashMap<&'static str, (f64, f64)>,
    intensifiers: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl PatternPolarityEstimator {
    pub fn new() -> Self {
        Self {
            lexicon: POLARITY.iter().map(|&(w, p, s)| (w, (p, s))).collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }
}

impl Default for PatternPolarityEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityEstimator for PatternPolarityEstimator {
    fn name(&self) -> &'static str {
        "pattern-polarity"
    }

    fn estimate(&self, text: &str) -> Result<PolarityScores, EstimatorError> {
        let tokens = tokenize(text);
        let mut readings = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let Some(&(mut polarity, mut subjectivity)) = self.lexicon.get(token.as_str()) else {
                continue;
            };
            if i >= 1 {
                if let Some(&scale) = self.intensifiers.get(tokens[i - 1].as_str()) {
                    polarity = (polarity * scale).clamp(-1.0, 1.0);
                    subjectivity = (subjectivity * scale).min(1.0);
                }
            }
            let negated = (1..=2)
                .filter(|&d| i >= d)
                .any(|d| self.negations.contains(tokens[i - d].as_str()));
            if negated {
                polarity *= -0.5;
            }
            readings.push((polarity, subjectivity));
        }

        if readings.is_empty() {
            return Ok(PolarityScores {
                polarity: 0.0,
                subjectivity: 0.0,
            });
        }

        let n = readings.len() as f64;
        Ok(PolarityScores {
            polarity: (readings.iter().map(|r| r.0).sum::<f64>() / n).clamp(-1.0, 1.0),
            subjectivity: (readings.iter().map(|r| r.1).sum::<f64>() / n).clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_contractions() {
        assert_eq!(
            tokenize("I can't say, it's GOOD!"),
            vec!["i", "can't", "say", "it's", "good"]
        );
    }

    #[test]
    fn test_positive_text_has_positive_compound() {
        let scores = ValenceLexiconEstimator::new()
            .estimate("I successfully led a great team and I am proud of it")
            .unwrap();
        assert!(scores.compound >= 0.05, "compound was {}", scores.compound);
        assert!(scores.positive > scores.negative);
    }

    #[test]
    fn test_negative_text_has_negative_compound() {
        let scores = ValenceLexiconEstimator::new()
            .estimate("The project failed and it was a terrible mistake")
            .unwrap();
        assert!(scores.compound <= -0.05, "compound was {}", scores.compound);
        assert!(scores.negative > scores.positive);
    }

    #[test]
    fn test_negation_flips_valence() {
        let est = ValenceLexiconEstimator::new();
        let plain = est.estimate("it was good").unwrap();
        let negated = est.estimate("it was not good").unwrap();
        assert!(plain.compound > 0.0);
        assert!(negated.compound < 0.0);
    }

    #[test]
    fn test_booster_increases_intensity() {
        let est = ValenceLexiconEstimator::new();
        let plain = est.estimate("the result was good").unwrap();
        let boosted = est.estimate("the result was very good").unwrap();
        assert!(boosted.compound > plain.compound);
    }

    #[test]
    fn test_breakdown_sums_to_one() {
        let scores = ValenceLexiconEstimator::new()
            .estimate("good design but a bad deadline and some plain words")
            .unwrap();
        let total = scores.positive + scores.neutral + scores.negative;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_punctuation_only_text_is_neutral() {
        let scores = ValenceLexiconEstimator::new().estimate("...").unwrap();
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.neutral, 1.0);
    }

    #[test]
    fn test_polarity_mean_of_matched_adjectives() {
        let scores = PatternPolarityEstimator::new()
            .estimate("a good and useful approach")
            .unwrap();
        assert!((scores.polarity - 0.5).abs() < 1e-9);
        assert!((scores.subjectivity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_polarity_negation_halves_and_flips() {
        let scores = PatternPolarityEstimator::new()
            .estimate("that was not good")
            .unwrap();
        assert!((scores.polarity + 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_polarity_without_matches_is_zero() {
        let scores = PatternPolarityEstimator::new()
            .estimate("the service uses a queue")
            .unwrap();
        assert_eq!(scores.polarity, 0.0);
        assert_eq!(scores.subjectivity, 0.0);
    }

    #[test]
    fn test_non_finite_valence_is_unavailable() {
        let mut estimator = ValenceLexiconEstimator::new();
        estimator.valence.insert("boundless", f64::INFINITY);

        let err = estimator.estimate("a boundless answer").unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::Unavailable {
                estimator: "valence-lexicon",
                ..
            }
        ));
    }
}
