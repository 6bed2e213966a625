use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::emotion::decode::decode_frame;
use crate::emotion::face::{crop_face, largest_face, FaceDetector};
use crate::emotion::heuristic::HeuristicClassifier;
use crate::emotion::{DetectionMethod, EmotionClassifier, EmotionDistribution, EmotionResult};

/// Runs face detection and a ranked chain of emotion classifiers over video frames.
///
/// Immutable after construction, so a single instance is shared across requests.
pub struct FacialEmotionScorer {
    detector: Arc<dyn FaceDetector>,
    classifiers: Vec<Arc<dyn EmotionClassifier>>,
}

impl FacialEmotionScorer {
    /// `classifiers` are tried in order. The heuristic classifier is appended when the
    /// chain does not already contain one, so every detected face gets a distribution.
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        mut classifiers: Vec<Arc<dyn EmotionClassifier>>,
    ) -> Self {
        if !classifiers
            .iter()
            .any(|c| c.method() == DetectionMethod::Heuristic)
        {
            classifiers.push(Arc::new(HeuristicClassifier));
        }
        Self {
            detector,
            classifiers,
        }
    }

    fn analyze_frame(&self, frame: &str) -> Option<(EmotionDistribution, DetectionMethod)> {
        let image = match decode_frame(frame) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to decode frame: {e}");
                return None;
            }
        };

        let Some(rect) = largest_face(&self.detector.detect(&image)) else {
            debug!("No face detected in {}x{} frame", image.width(), image.height());
            return None;
        };
        let face = crop_face(&image, rect)?;

        self.classifiers.iter().find_map(|classifier| {
            classifier
                .classify(&face)
                .map(|dist| (dist, classifier.method()))
        })
    }

    /// Single-image analysis. Decode failures and faceless images give the default result.
    pub fn analyze_image(&self, frame: &str) -> EmotionResult {
        match self.analyze_frame(frame) {
            Some((dist, method)) => {
                let result = EmotionResult::from_distribution(dist, method, 1);
                debug!(
                    "{:?} detected {} ({:.2})",
                    method,
                    result.dominant_emotion.as_str(),
                    result.max_confidence
                );
                result
            }
            None => EmotionResult::default(),
        }
    }

    /// Averages the per-frame distributions of every frame in which a face was found.
    ///
    /// Frames are processed in parallel; the mean is taken in input order, so the
    /// result does not depend on scheduling.
    pub fn analyze_frames(&self, frames: &[String]) -> EmotionResult {
        if frames.is_empty() {
            return EmotionResult::default();
        }
        if let [frame] = frames {
            return self.analyze_image(frame);
        }

        let analyzed: Vec<(EmotionDistribution, DetectionMethod)> = frames
            .par_iter()
            .map(|frame| self.analyze_frame(frame))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        info!("Analyzed {}/{} frames", analyzed.len(), frames.len());

        let Some(method) = analyzed.iter().map(|(_, method)| *method).max() else {
            warn!("No frames analyzed successfully");
            return EmotionResult::default();
        };
        let Some(mean) = EmotionDistribution::mean(analyzed.iter().map(|(dist, _)| dist)) else {
            return EmotionResult::default();
        };

        EmotionResult::from_distribution(mean, method, analyzed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::decode::tests::encode_png;
    use crate::emotion::face::{FaceRect, NoFaceDetector};
    use crate::emotion::{ConfidenceLevel, Emotion};
    use crate::models::interview::InterviewState;
    use image::{GrayImage, Luma};

    /// Reports the whole image as one face.
    struct WholeImageDetector;

    impl FaceDetector for WholeImageDetector {
        fn detect(&self, image: &GrayImage) -> Vec<FaceRect> {
            vec![FaceRect {
                x: 0,
                y: 0,
                width: image.width(),
                height: image.height(),
            }]
        }
    }

    struct FixedClassifier(DetectionMethod, Option<EmotionDistribution>);

    impl EmotionClassifier for FixedClassifier {
        fn method(&self) -> DetectionMethod {
            self.0
        }
        fn classify(&self, _face: &GrayImage) -> Option<EmotionDistribution> {
            self.1.clone()
        }
    }

    fn heuristic_scorer() -> FacialEmotionScorer {
        FacialEmotionScorer::new(Arc::new(WholeImageDetector), vec![])
    }

    fn smiling_frame() -> String {
        let face = GrayImage::from_fn(96, 96, |x, y| {
            if y >= 80 && (24..72).contains(&x) {
                Luma([250])
            } else {
                Luma([100])
            }
        });
        encode_png(&face)
    }

    fn flat_frame() -> String {
        encode_png(&GrayImage::from_pixel(96, 96, Luma([120])))
    }

    #[test]
    fn test_zero_frames_returns_default() {
        assert_eq!(heuristic_scorer().analyze_frames(&[]), EmotionResult::default());
    }

    #[test]
    fn test_single_frame_matches_image_analysis() {
        let scorer = heuristic_scorer();
        let frame = smiling_frame();
        let single = scorer.analyze_image(&frame);
        let aggregated = scorer.analyze_frames(&[frame]);
        assert_eq!(single, aggregated);
        assert_eq!(aggregated.frames_analyzed, 1);
        assert_eq!(aggregated.detection_method, DetectionMethod::Heuristic);
        assert_eq!(aggregated.dominant_emotion, Emotion::Happy);
    }

    #[test]
    fn test_undecodable_frames_are_skipped() {
        let scorer = heuristic_scorer();
        let frames = vec![
            "data:image/png;base64,not-a-frame".to_string(),
            smiling_frame(),
            String::new(),
        ];
        let result = scorer.analyze_frames(&frames);
        assert_eq!(result.frames_analyzed, 1);
        assert_eq!(result.dominant_emotion, Emotion::Happy);
    }

    #[test]
    fn test_all_frames_failing_returns_default() {
        let scorer = heuristic_scorer();
        let result = scorer.analyze_frames(&["###".to_string(), "".to_string()]);
        assert_eq!(result, EmotionResult::default());
    }

    #[test]
    fn test_no_face_means_default() {
        let scorer = FacialEmotionScorer::new(Arc::new(NoFaceDetector), vec![]);
        assert_eq!(scorer.analyze_image(&smiling_frame()), EmotionResult::default());
        assert_eq!(
            scorer.analyze_frames(&[smiling_frame(), flat_frame()]),
            EmotionResult::default()
        );
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let scorer = heuristic_scorer();
        let forward = scorer.analyze_frames(&[smiling_frame(), flat_frame()]);
        let backward = scorer.analyze_frames(&[flat_frame(), smiling_frame()]);
        assert_eq!(forward.frames_analyzed, 2);
        assert_eq!(forward.dominant_emotion, backward.dominant_emotion);
        for emotion in Emotion::ALL {
            assert!((forward.emotions.get(emotion) - backward.emotions.get(emotion)).abs() < 1e-12);
        }
        assert!((forward.emotions.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_model_classifier_preferred_when_it_answers() {
        let happy = EmotionDistribution::from_scores([(Emotion::Happy, 0.9), (Emotion::Neutral, 0.1)]);
        let scorer = FacialEmotionScorer::new(
            Arc::new(WholeImageDetector),
            vec![Arc::new(FixedClassifier(DetectionMethod::FerPlus, Some(happy)))],
        );
        let result = scorer.analyze_image(&flat_frame());
        assert_eq!(result.detection_method, DetectionMethod::FerPlus);
        assert_eq!(result.dominant_emotion, Emotion::Happy);
        assert_eq!(result.confidence_level, ConfidenceLevel::High);
        assert_eq!(result.interview_state, InterviewState::Confident);
    }

    #[test]
    fn test_unavailable_model_falls_through_to_heuristic() {
        let scorer = FacialEmotionScorer::new(
            Arc::new(WholeImageDetector),
            vec![Arc::new(FixedClassifier(DetectionMethod::FerPlus, None))],
        );
        let result = scorer.analyze_image(&flat_frame());
        assert_eq!(result.detection_method, DetectionMethod::Heuristic);
        assert_eq!(result.dominant_emotion, Emotion::Neutral);
    }
}
