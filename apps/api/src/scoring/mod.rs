//! Score fusion: normalizes content, sentiment and emotion signals and blends them
//! into a single 1–10 interview score.

pub mod fusion;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fusion::{combine_scores, CombinedScore};

/// Tolerance used when checking that weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative contribution of each signal to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub content: f64,
    pub sentiment: f64,
    pub emotion: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            content: 0.6,
            sentiment: 0.25,
            emotion: 0.15,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight '{0}' must be a finite, non-negative number")]
    Invalid(&'static str),

    #[error("weights must sum to 1.0 (got {0:.4})")]
    BadSum(f64),
}

impl FusionWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, value) in [
            ("content", self.content),
            ("sentiment", self.sentiment),
            ("emotion", self.emotion),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightsError::Invalid(name));
            }
        }
        let sum = self.content + self.sentiment + self.emotion;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(())
    }
}

/// Rounds half away from zero at `places` decimals.
///
/// The scaled value is nudged by 1e-9 toward its sign first so that a decimal `.5`
/// stored as `…4999999` in binary still rounds up (8.25 → 8.3).
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    let nudged = scaled + scaled.signum() * 1e-9;
    nudged.round() / factor
}
