use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, Luma, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("decoded image is empty")]
    Empty,
}

/// Decodes a base64 frame, optionally prefixed with a data URL header
/// (`data:image/jpeg;base64,`), into an 8-bit grayscale buffer.
pub fn decode_frame(data: &str) -> Result<GrayImage, DecodeError> {
    let payload = data.split_once(',').map_or(data, |(_, rest)| rest);
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD.decode(compact.as_bytes())?;
    let image = image::load_from_memory(&bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::Empty);
    }

    Ok(to_luma(&image.to_rgb8()))
}

/// ITU-R BT.601 luma, integer-rounded.
pub fn to_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let y = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([y as u8])
    })
}
