//! Pixel normalization.
//!
//! Normalization is expressed as a channelwise affine transform
//! `value * alpha + beta`, which covers both schemes the registered models
//! were trained with: plain scaling into [0, 1] and the Inception convention
//! mapping into [-1, 1].

use crate::core::Tensor4D;
use crate::core::errors::PredictError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// The named normalization schemes supported by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalizationKind {
    /// Divide every channel value by 255, producing floats in [0, 1].
    ScaleToUnit,
    /// The Keras InceptionV3 training convention: `value / 127.5 - 1`,
    /// producing floats in [-1, 1].
    Inception,
}

/// Normalizes RGB images into NHWC float tensors.
///
/// Holds the precomputed per-channel factors `alpha = scale / std` and
/// `beta = -mean / std`.
#[derive(Debug)]
pub struct NormalizeImage {
    alpha: [f32; 3],
    beta: [f32; 3],
}

impl NormalizeImage {
    /// Creates a normalizer from scale/mean/std parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Scaling factor applied before mean subtraction.
    /// * `mean` - Per-channel mean values.
    /// * `std` - Per-channel standard deviations.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ConfigError`] if scale is not positive or any
    /// standard deviation is not positive.
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> Result<Self, PredictError> {
        if scale <= 0.0 {
            return Err(PredictError::config("scale must be greater than 0"));
        }
        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(PredictError::config(format!(
                    "standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let mut alpha = [0.0; 3];
        let mut beta = [0.0; 3];
        for c in 0..3 {
            alpha[c] = scale / std[c];
            beta[c] = -mean[c] / std[c];
        }
        Ok(Self { alpha, beta })
    }

    /// Creates the normalizer for a named scheme.
    pub fn for_kind(kind: NormalizationKind) -> Result<Self, PredictError> {
        match kind {
            NormalizationKind::ScaleToUnit => {
                Self::new(1.0 / 255.0, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
            }
            NormalizationKind::Inception => {
                Self::new(2.0 / 255.0, [1.0, 1.0, 1.0], [1.0, 1.0, 1.0])
            }
        }
    }

    /// Normalizes a single image into an NHWC tensor with batch dimension 1.
    ///
    /// # Errors
    ///
    /// Returns a tensor error if the pixel buffer cannot be reshaped, which
    /// indicates a corrupted image buffer.
    pub fn normalize_to(&self, img: &RgbImage) -> Result<Tensor4D, PredictError> {
        let (width, height) = img.dimensions();
        let mut result = vec![0.0f32; (height * width * 3) as usize];

        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x, y);
                for c in 0..3 {
                    let dst_idx = ((y * width + x) * 3 + c as u32) as usize;
                    result[dst_idx] = pixel[c] as f32 * self.alpha[c] + self.beta[c];
                }
            }
        }

        Tensor4D::from_shape_vec((1, height as usize, width as usize, 3), result)
            .map_err(PredictError::Tensor)
    }
}
