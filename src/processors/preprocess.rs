//! Model-specific input preparation.
//!
//! Every registered model declares an [`InputProfile`]; the preprocessor turns
//! the canonical RGB image into one tensor per distinct profile. The resize is
//! a plain fixed-size resize with no letterboxing, so non-square inputs are
//! distorted. That mirrors the training-time preprocessing of the registered
//! models and must not be "fixed" independently of them.

use crate::core::Tensor4D;
use crate::core::errors::PredictError;
use crate::processors::normalization::{NormalizationKind, NormalizeImage};
use image::{RgbImage, imageops};

/// The input contract a model declares: target size plus normalization.
///
/// Profiles are `Eq + Hash` so the pipeline can prepare one tensor per
/// distinct profile and share it across models that declare the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputProfile {
    /// Target height in pixels.
    pub height: u32,
    /// Target width in pixels.
    pub width: u32,
    /// The normalization scheme to apply after resizing.
    pub normalization: NormalizationKind,
}

impl InputProfile {
    /// Creates a new profile.
    pub fn new(height: u32, width: u32, normalization: NormalizationKind) -> Self {
        Self {
            height,
            width,
            normalization,
        }
    }

    /// The `[height, width, channels]` triple reported in responses.
    pub fn input_size(&self) -> [u32; 3] {
        [self.height, self.width, 3]
    }
}

/// Prepares a model input tensor from the canonical image.
///
/// Resizes with bilinear filtering to exactly the profile's target size, then
/// applies the profile's normalization. The result is NHWC with a leading
/// singleton batch dimension.
///
/// # Arguments
///
/// * `image` - The decoded canonical RGB image.
/// * `profile` - The target size and normalization to apply.
pub fn prepare(image: &RgbImage, profile: &InputProfile) -> Result<Tensor4D, PredictError> {
    let resized = imageops::resize(
        image,
        profile.width,
        profile.height,
        imageops::FilterType::Triangle,
    );
    NormalizeImage::for_kind(profile.normalization)?.normalize_to(&resized)
}
