//! FER+ classifier: the pretrained ONNX emotion model, loaded lazily on first use.
//!
//! The model takes a `1×1×64×64` grayscale tensor scaled to roughly `[-1, 1]` and
//! returns 8 logits over the FER+ label set. The ONNX runtime itself is only compiled
//! with the `fer-model` cargo feature; without it the loader always reports the model
//! as unavailable and classification falls through to the heuristic.

use std::path::Path;
use std::sync::OnceLock;

use image::imageops::{self, FilterType};
use image::GrayImage;
use thiserror::Error;
use tracing::{info, warn};

use crate::emotion::model_store::{ModelStore, ModelStoreError, FERPLUS_ARTIFACT};
use crate::emotion::{DetectionMethod, Emotion, EmotionClassifier, EmotionDistribution};

pub const INPUT_SIZE: u32 = 64;
#[cfg(feature = "fer-model")]
pub const INPUT_NAME: &str = "Input3";

/// FER+ output order, with the app label each maps onto. Contempt folds into disgust.
pub const FERPLUS_LABELS: [(&str, Emotion); 8] = [
    ("neutral", Emotion::Neutral),
    ("happiness", Emotion::Happy),
    ("surprise", Emotion::Surprise),
    ("sadness", Emotion::Sad),
    ("anger", Emotion::Angry),
    ("disgust", Emotion::Disgust),
    ("fear", Emotion::Fear),
    ("contempt", Emotion::Disgust),
];

#[derive(Debug, Error)]
pub enum FerPlusError {
    #[error("model artifact unavailable: {0}")]
    Artifact(#[from] ModelStoreError),

    #[cfg(feature = "fer-model")]
    #[error("failed to load FER+ session: {0}")]
    Session(String),

    #[cfg(feature = "fer-model")]
    #[error("FER+ inference failed: {0}")]
    Inference(String),

    #[cfg(not(feature = "fer-model"))]
    #[error("FER+ support not compiled in (enable the `fer-model` feature)")]
    NotCompiled,
}

/// Numerically stable softmax. Degenerate input yields a uniform distribution.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    if total > 0.0 && total.is_finite() {
        exps.iter().map(|e| e / total).collect()
    } else {
        vec![1.0 / logits.len().max(1) as f32; logits.len()]
    }
}

/// Folds FER+ probabilities onto the seven app labels and renormalizes.
pub fn map_ferplus_probabilities(probabilities: &[f32]) -> EmotionDistribution {
    let mut scores = Emotion::ALL.map(|e| (e, 0.0_f64));
    for ((_, target), &p) in FERPLUS_LABELS.iter().zip(probabilities) {
        if let Some(slot) = scores.iter_mut().find(|(e, _)| e == target) {
            slot.1 += p as f64;
        }
    }
    EmotionDistribution::from_scores(scores).normalized()
}

/// 64×64 bilinear resize, then `(x / 255 − 0.5) / 0.5`, row-major.
pub fn preprocess(face: &GrayImage) -> Vec<f32> {
    let resized = imageops::resize(face, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    resized
        .pixels()
        .map(|p| (p.0[0] as f32 / 255.0 - 0.5) / 0.5)
        .collect()
}

/// A loaded FER+ model: preprocessed input in, raw logits out.
pub trait FerPlusRuntime: Send + Sync {
    fn infer(&self, input: &[f32]) -> Result<Vec<f32>, FerPlusError>;
}

type RuntimeLoader = Box<dyn Fn() -> Result<Box<dyn FerPlusRuntime>, FerPlusError> + Send + Sync>;

/// Loads its runtime on the first `classify` call. The outcome, loaded or not, is kept
/// for the life of the classifier.
pub struct LazyFerPlusClassifier {
    loader: RuntimeLoader,
    runtime: OnceLock<Option<Box<dyn FerPlusRuntime>>>,
}

impl LazyFerPlusClassifier {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn FerPlusRuntime>, FerPlusError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            runtime: OnceLock::new(),
        }
    }

    /// Fetches the FER+ artifact through `store`, then opens an ONNX session on it.
    pub fn from_store(store: ModelStore) -> Self {
        Self::new(move || {
            let path = store.ensure(&FERPLUS_ARTIFACT)?;
            load_session(&path)
        })
    }

    fn runtime(&self) -> Option<&dyn FerPlusRuntime> {
        self.runtime
            .get_or_init(|| match (self.loader)() {
                Ok(runtime) => {
                    info!("FER+ emotion model initialized");
                    Some(runtime)
                }
                Err(e) => {
                    warn!("FER+ emotion model unavailable, using heuristic classifier: {e}");
                    None
                }
            })
            .as_deref()
    }
}

impl EmotionClassifier for LazyFerPlusClassifier {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::FerPlus
    }

    fn classify(&self, face: &GrayImage) -> Option<EmotionDistribution> {
        let runtime = self.runtime()?;
        match runtime.infer(&preprocess(face)) {
            Ok(logits) if logits.len() == FERPLUS_LABELS.len() => {
                Some(map_ferplus_probabilities(&softmax(&logits)))
            }
            Ok(logits) => {
                warn!("FER+ returned {} outputs, expected {}", logits.len(), FERPLUS_LABELS.len());
                None
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

#[cfg(feature = "fer-model")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ndarray::Array4;
    use ort::session::Session;
    use ort::value::Tensor;

    use super::{FerPlusError, FerPlusRuntime, INPUT_NAME, INPUT_SIZE};

    /// `Session::run` needs `&mut self`, so the session sits behind a mutex.
    pub struct OnnxFerPlusRuntime {
        session: Mutex<Session>,
    }

    impl OnnxFerPlusRuntime {
        pub fn open(path: &Path) -> Result<Self, FerPlusError> {
            let session = Session::builder()
                .and_then(|b| b.with_intra_threads(1))
                .and_then(|b| b.commit_from_file(path))
                .map_err(|e| FerPlusError::Session(e.to_string()))?;
            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl FerPlusRuntime for OnnxFerPlusRuntime {
        fn infer(&self, input: &[f32]) -> Result<Vec<f32>, FerPlusError> {
            let side = INPUT_SIZE as usize;
            let array = Array4::from_shape_vec((1, 1, side, side), input.to_vec())
                .map_err(|e| FerPlusError::Inference(format!("input shape: {e}")))?;
            let tensor =
                Tensor::from_array(array).map_err(|e| FerPlusError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| FerPlusError::Inference("session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![INPUT_NAME => tensor])
                .map_err(|e| FerPlusError::Inference(e.to_string()))?;

            let (_, value) = outputs
                .iter()
                .next()
                .ok_or_else(|| FerPlusError::Inference("model produced no output".to_string()))?;
            let (_shape, logits) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| FerPlusError::Inference(e.to_string()))?;
            Ok(logits.to_vec())
        }
    }
}

#[cfg(feature = "fer-model")]
pub fn load_session(path: &Path) -> Result<Box<dyn FerPlusRuntime>, FerPlusError> {
    Ok(Box::new(onnx::OnnxFerPlusRuntime::open(path)?))
}

#[cfg(not(feature = "fer-model"))]
pub fn load_session(_path: &Path) -> Result<Box<dyn FerPlusRuntime>, FerPlusError> {
    Err(FerPlusError::NotCompiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedLogits(Vec<f32>);

    impl FerPlusRuntime for FixedLogits {
        fn infer(&self, input: &[f32]) -> Result<Vec<f32>, FerPlusError> {
            assert_eq!(input.len(), (INPUT_SIZE * INPUT_SIZE) as usize);
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_contempt_maps_to_disgust() {
        let probs = [0.0, 0.0, 0.0, 0.0, 0.0, 0.25, 0.0, 0.75];
        let d = map_ferplus_probabilities(&probs);
        assert!((d.get(Emotion::Disgust) - 1.0).abs() < 1e-9);
        assert_eq!(d.iter().count(), 7);
    }

    #[test]
    fn test_mapping_follows_label_order() {
        let probs = [0.1, 0.6, 0.05, 0.05, 0.05, 0.05, 0.05, 0.05];
        let d = map_ferplus_probabilities(&probs);
        assert_eq!(d.dominant().0, Emotion::Happy);
        assert!((d.get(Emotion::Disgust) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_scales_to_unit_range() {
        let white = preprocess(&GrayImage::from_pixel(32, 32, Luma([255])));
        let black = preprocess(&GrayImage::from_pixel(128, 128, Luma([0])));
        assert_eq!(white.len(), 64 * 64);
        assert!(white.iter().all(|v| (v - 1.0).abs() < 1e-6));
        assert!(black.iter().all(|v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_lazy_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let classifier = LazyFerPlusClassifier::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedLogits(vec![0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])) as Box<dyn FerPlusRuntime>)
        });

        let face = GrayImage::from_pixel(48, 48, Luma([128]));
        for _ in 0..3 {
            let d = classifier.classify(&face).unwrap();
            assert_eq!(d.dominant().0, Emotion::Happy);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_cached_and_yields_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let classifier = LazyFerPlusClassifier::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(FerPlusError::Artifact(ModelStoreError::NoCacheDir))
        });

        let face = GrayImage::from_pixel(48, 48, Luma([128]));
        assert!(classifier.classify(&face).is_none());
        assert!(classifier.classify(&face).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrong_output_width_yields_none() {
        let classifier = LazyFerPlusClassifier::new(|| {
            Ok(Box::new(FixedLogits(vec![1.0, 2.0])) as Box<dyn FerPlusRuntime>)
        });
        assert!(classifier.classify(&GrayImage::new(8, 8)).is_none());
    }

    #[cfg(not(feature = "fer-model"))]
    #[test]
    fn test_session_unavailable_without_feature() {
        let result = load_session(Path::new("emotion-ferplus-8.onnx"));
        assert!(matches!(result, Err(FerPlusError::NotCompiled)));
    }
}
