//! Face detection: locate the face region that the emotion classifiers look at.

use std::io::Cursor;
use std::path::Path;

use image::{imageops, GrayImage};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FaceModelError {
    #[error("failed to read face model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid face model {path}: {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<FaceRect>;
}

/// Largest candidate by area; the first one wins a tie.
pub fn largest_face(faces: &[FaceRect]) -> Option<FaceRect> {
    faces.iter().copied().fold(None, |best, face| match best {
        Some(b) if b.area() >= face.area() => Some(b),
        _ => Some(face),
    })
}

/// Crops `rect` out of `image`, clipped to the image bounds.
pub fn crop_face(image: &GrayImage, rect: FaceRect) -> Option<GrayImage> {
    let x = rect.x.min(image.width());
    let y = rect.y.min(image.height());
    let width = rect.width.min(image.width() - x);
    let height = rect.height.min(image.height() - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(imageops::crop_imm(image, x, y, width, height).to_image())
}

/// Used when no detector model is configured; every frame comes back faceless.
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _image: &GrayImage) -> Vec<FaceRect> {
        Vec::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SeetaFace (rustface) frontal detector
// ────────────────────────────────────────────────────────────────────────────

const MIN_FACE_SIZE: u32 = 30;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE: f32 = 0.8;
const WINDOW_STEP: u32 = 4;

/// Frontal-face cascade backed by a SeetaFace model file.
///
/// rustface detectors are stateful and not `Send`, so each call builds its own
/// detector from the model bytes held here.
pub struct SeetaFaceDetector {
    model: Vec<u8>,
}

impl SeetaFaceDetector {
    pub fn from_file(path: &Path) -> Result<Self, FaceModelError> {
        let display = path.display().to_string();
        let model = std::fs::read(path).map_err(|source| FaceModelError::Io {
            path: display.clone(),
            source,
        })?;
        rustface::read_model(Cursor::new(&model)).map_err(|e| FaceModelError::Invalid {
            path: display,
            reason: e.to_string(),
        })?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn detect(&self, image: &GrayImage) -> Vec<FaceRect> {
        let model = match rustface::read_model(Cursor::new(&self.model)) {
            Ok(model) => model,
            Err(e) => {
                warn!("Face model could not be parsed: {e}");
                return Vec::new();
            }
        };

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let data = rustface::ImageData::new(image.as_raw(), image.width(), image.height());
        detector
            .detect(&data)
            .into_iter()
            .map(|face| {
                let bbox = face.bbox();
                clip_to_image(bbox.x(), bbox.y(), bbox.width(), bbox.height())
            })
            .collect()
    }
}

/// Boxes may start above or left of the image; the overshoot is cut from the size.
fn clip_to_image(x: i32, y: i32, width: u32, height: u32) -> FaceRect {
    FaceRect {
        x: x.max(0) as u32,
        y: y.max(0) as u32,
        width: width.saturating_sub(x.min(0).unsigned_abs()),
        height: height.saturating_sub(y.min(0).unsigned_abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> FaceRect {
        FaceRect { x, y, width, height }
    }

    #[test]
    fn test_box_outside_top_left_is_clipped() {
        assert_eq!(clip_to_image(-10, -5, 100, 80), rect(0, 0, 90, 75));
        assert_eq!(clip_to_image(12, 7, 100, 80), rect(12, 7, 100, 80));
        assert_eq!(clip_to_image(-120, 0, 100, 80), rect(0, 0, 0, 80));
    }

    #[test]
    fn test_largest_face_by_area() {
        let faces = [rect(0, 0, 10, 10), rect(5, 5, 40, 30), rect(1, 1, 20, 20)];
        assert_eq!(largest_face(&faces), Some(rect(5, 5, 40, 30)));
    }

    #[test]
    fn test_largest_face_first_on_tie() {
        let faces = [rect(0, 0, 20, 10), rect(9, 9, 10, 20)];
        assert_eq!(largest_face(&faces), Some(rect(0, 0, 20, 10)));
        assert_eq!(largest_face(&[]), None);
    }

    #[test]
    fn test_crop_clips_to_bounds() {
        let image = GrayImage::from_fn(50, 40, |x, _| Luma([x as u8]));
        let face = crop_face(&image, rect(30, 20, 100, 100)).unwrap();
        assert_eq!(face.dimensions(), (20, 20));
        assert_eq!(face.get_pixel(0, 0).0, [30]);
    }

    #[test]
    fn test_crop_outside_image_is_none() {
        let image = GrayImage::new(10, 10);
        assert!(crop_face(&image, rect(10, 0, 5, 5)).is_none());
        assert!(crop_face(&image, rect(0, 0, 0, 5)).is_none());
    }

    #[test]
    fn test_no_face_detector_finds_nothing() {
        assert!(NoFaceDetector.detect(&GrayImage::new(64, 64)).is_empty());
    }

    #[test]
    fn test_missing_model_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SeetaFaceDetector::from_file(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(FaceModelError::Io { .. })));
    }
}
