//! Per-model inference runner.
//!
//! Wraps a single loaded classifier behind a uniform contract: given a
//! prepared tensor, produce a valid probability distribution plus the
//! wall-clock latency of exactly the classifier call. Raw outputs from models
//! trained with a terminal softmax layer pass through untouched; unnormalized
//! logits go through a numerically stabilized softmax.

use crate::core::Tensor4D;
use crate::core::errors::PredictError;
use crate::core::inference::Classifier;
use crate::core::labels::{CLASS_NAMES, DISTRIBUTION_SUM_TOLERANCE, Distribution};
use crate::processors::InputProfile;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// The output of one classifier call.
#[derive(Debug, Clone)]
pub struct Inference {
    /// The normalized probability distribution over the class labels.
    pub distribution: Distribution,
    /// Wall-clock duration of the classifier call in milliseconds.
    pub latency_ms: f64,
}

/// A registered model: a loaded classifier plus its declared input contract.
#[derive(Debug)]
pub struct ModelRunner {
    name: Arc<str>,
    profile: InputProfile,
    classifier: Box<dyn Classifier>,
}

impl ModelRunner {
    /// Creates a runner for a loaded classifier.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name used in responses and logs.
    /// * `profile` - The input shape and normalization the classifier expects.
    /// * `classifier` - The loaded classifier handle.
    pub fn new(name: impl Into<Arc<str>>, profile: InputProfile, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            profile,
            classifier,
        }
    }

    /// The model's display name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The input profile the model's tensors must match.
    pub fn profile(&self) -> &InputProfile {
        &self.profile
    }

    /// Runs the classifier on a prepared tensor.
    ///
    /// Latency is measured around exactly the classifier call, excluding
    /// preprocessing and normalization of the output.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Inference`] if the classifier call fails, or
    /// [`PredictError::ShapeMismatch`] if the raw output does not have one
    /// score per class label.
    pub fn run(&self, input: &Tensor4D) -> Result<Inference, PredictError> {
        let start = Instant::now();
        let raw = self.classifier.scores(input)?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let distribution = normalize_scores(raw)?;
        debug!(
            model = %self.name,
            latency_ms,
            label = distribution.top().0,
            "classifier call completed"
        );

        Ok(Inference {
            distribution,
            latency_ms,
        })
    }
}

/// Turns a raw score vector into a valid probability distribution.
///
/// If the vector already sums to 1.0 within [`DISTRIBUTION_SUM_TOLERANCE`]
/// the model applied its own normalizing layer and the values pass through
/// unchanged. Otherwise the stabilized softmax `exp(x - max) / sum` is
/// applied. Applying softmax to an already-normalized vector would flatten
/// it, so the branch condition must stay exact.
pub fn normalize_scores(raw: Vec<f32>) -> Result<Distribution, PredictError> {
    if raw.len() != CLASS_NAMES.len() {
        return Err(PredictError::ShapeMismatch {
            expected: CLASS_NAMES.len(),
            actual: raw.len(),
        });
    }

    let sum: f32 = raw.iter().sum();
    if (sum - 1.0).abs() <= DISTRIBUTION_SUM_TOLERANCE {
        return Distribution::from_values(raw);
    }

    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = raw.iter().map(|&x| (x - max).exp()).collect();
    let denom: f32 = exps.iter().sum();
    Distribution::from_values(exps.into_iter().map(|e| e / denom).collect())
}
