//! Upload decoding.
//!
//! Turns arbitrary uploaded bytes into the canonical in-memory representation:
//! an 8-bit RGB bitmap with explicit dimensions and no remaining container
//! metadata.

use crate::core::errors::PredictError;
use image::RgbImage;

/// Decodes uploaded bytes into a canonical RGB image.
///
/// Any color mode the container carries (grayscale, RGBA, palette) is
/// collapsed to 3-channel RGB; alpha is dropped. All raster formats supported
/// by the `image` crate are accepted.
///
/// # Errors
///
/// Returns [`PredictError::UnsupportedFormat`] for malformed, truncated,
/// empty or unrecognized byte streams. This is a pure transform and never
/// panics on hostile input.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PredictError> {
    let img = image::load_from_memory(bytes).map_err(PredictError::UnsupportedFormat)?;
    Ok(img.to_rgb8())
}
