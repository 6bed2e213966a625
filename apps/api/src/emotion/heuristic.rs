//! Pixel-statistics emotion classifier. Always available; it is the last entry in every
//! classifier chain.
//!
//! The face crop is scaled to 96×96 and split into horizontal thirds (forehead, eyes,
//! nose/mouth). Brightness ratios between the mouth region and the whole face, overall
//! contrast and darkness of the upper face nudge a fixed prior toward the matching
//! emotions.

use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::trace;

use crate::emotion::{DetectionMethod, Emotion, EmotionClassifier, EmotionDistribution};

const FACE_SIZE: u32 = 96;

const PRIORS: [(Emotion, f64); 7] = [
    (Emotion::Neutral, 0.25),
    (Emotion::Happy, 0.15),
    (Emotion::Sad, 0.15),
    (Emotion::Angry, 0.15),
    (Emotion::Fear, 0.1),
    (Emotion::Surprise, 0.1),
    (Emotion::Disgust, 0.1),
];

#[derive(Debug, Clone, Copy)]
struct RegionStats {
    mean: f64,
    std: f64,
}

/// Mean and population standard deviation of `image[rows, cols]`.
fn region_stats(image: &GrayImage, rows: (u32, u32), cols: (u32, u32)) -> RegionStats {
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut n = 0.0;
    for y in rows.0..rows.1 {
        for x in cols.0..cols.1 {
            let v = image.get_pixel(x, y).0[0] as f64;
            sum += v;
            sum_sq += v * v;
            n += 1.0;
        }
    }
    if n == 0.0 {
        return RegionStats { mean: 0.0, std: 0.0 };
    }
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    RegionStats {
        mean,
        std: variance.sqrt(),
    }
}

#[derive(Debug, Clone, Copy)]
struct FaceStats {
    overall: RegionStats,
    top: f64,
    middle: f64,
    eyes: f64,
    mouth: RegionStats,
}

impl FaceStats {
    fn measure(face: &GrayImage) -> Self {
        let (w, h) = face.dimensions();
        let (third, two_thirds) = (h / 3, 2 * h / 3);
        let left_eye = region_stats(face, (third, two_thirds), (0, w / 2)).mean;
        let right_eye = region_stats(face, (third, two_thirds), (w / 2, w)).mean;

        Self {
            overall: region_stats(face, (0, h), (0, w)),
            top: region_stats(face, (0, third), (0, w)).mean,
            middle: region_stats(face, (third, two_thirds), (0, w)).mean,
            eyes: (left_eye + right_eye) / 2.0,
            mouth: region_stats(face, (two_thirds + h / 6, h), (w / 4, 3 * w / 4)),
        }
    }
}

/// Classifies a grayscale face crop of any size.
pub fn classify_face(face: &GrayImage) -> EmotionDistribution {
    let scaled;
    let face = if face.dimensions() == (FACE_SIZE, FACE_SIZE) {
        face
    } else {
        scaled = imageops::resize(face, FACE_SIZE, FACE_SIZE, FilterType::Triangle);
        &scaled
    };

    let stats = FaceStats::measure(face);
    trace!(
        mean = stats.overall.mean,
        std = stats.overall.std,
        top = stats.top,
        middle = stats.middle,
        eyes = stats.eyes,
        mouth = stats.mouth.mean,
        "Heuristic face statistics"
    );

    let mut scores = PRIORS;
    let mut bump = |emotion: Emotion, delta: f64| {
        if let Some(slot) = scores.iter_mut().find(|(e, _)| *e == emotion) {
            slot.1 += delta;
        }
    };

    let mean = stats.overall.mean;
    let std = stats.overall.std;

    if mean > 0.0 {
        let mouth_ratio = stats.mouth.mean / mean;
        if mouth_ratio > 1.15 {
            bump(Emotion::Happy, 0.5);
            bump(Emotion::Neutral, -0.2);
            bump(Emotion::Sad, -0.15);
        } else if mouth_ratio < 0.85 {
            bump(Emotion::Sad, 0.4);
            bump(Emotion::Angry, 0.2);
            bump(Emotion::Neutral, -0.3);
        }
    }

    // Wide eyes: bright, high-contrast middle band.
    if std > 30.0 && stats.middle > mean * 1.1 {
        bump(Emotion::Surprise, 0.4);
        bump(Emotion::Fear, 0.2);
        bump(Emotion::Neutral, -0.3);
    }

    if std > 25.0 && stats.middle > mean * 1.05 && stats.mouth.std < 15.0 {
        bump(Emotion::Fear, 0.3);
        bump(Emotion::Surprise, 0.2);
        bump(Emotion::Neutral, -0.25);
    }

    // Lowered brows darken forehead and eyes.
    if stats.top < mean * 0.9 && stats.middle < mean * 0.95 {
        bump(Emotion::Angry, 0.35);
        bump(Emotion::Sad, 0.15);
        bump(Emotion::Neutral, -0.25);
    }

    if stats.top < mean * 0.92 && stats.mouth.std > 20.0 {
        bump(Emotion::Disgust, 0.3);
        bump(Emotion::Angry, 0.15);
        bump(Emotion::Neutral, -0.2);
    }

    if mean < 100.0 && stats.mouth.mean < mean * 0.9 && std < 20.0 {
        bump(Emotion::Sad, 0.4);
        bump(Emotion::Neutral, -0.2);
        bump(Emotion::Happy, -0.15);
    }

    EmotionDistribution::from_scores(scores).normalized()
}

pub struct HeuristicClassifier;

impl EmotionClassifier for HeuristicClassifier {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Heuristic
    }

    fn classify(&self, face: &GrayImage) -> Option<EmotionDistribution> {
        Some(classify_face(face))
    }
}
