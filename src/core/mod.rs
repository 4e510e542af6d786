//! Core types of the prediction service: errors, configuration, class labels,
//! the classifier abstraction and the model registry.

pub mod config;
pub mod errors;
pub mod inference;
pub mod labels;
pub mod registry;
pub mod runner;

/// A 4-dimensional input tensor (batch, height, width, channels).
pub type Tensor4D = ndarray::Array4<f32>;

pub use config::AppConfig;
pub use errors::PredictError;
pub use inference::{Classifier, OrtClassifier};
pub use labels::{CLASS_NAMES, Distribution};
pub use registry::{ModelRegistry, ModelSpec, default_specs};
pub use runner::{Inference, ModelRunner, normalize_scores};
