//! # nephroscan
//!
//! A kidney CT classification service that runs an uploaded scan through
//! three independently trained classifiers (VGG19, ResNet50, InceptionV3)
//! and returns per-model and ensembled predictions over a fixed label set
//! (`Cyst`, `Normal`, `Stone`, `Tumor`).
//!
//! ## Components
//!
//! * [`core`] - Errors, configuration, class labels, the classifier
//!   abstraction and the startup-time model registry
//! * [`processors`] - Upload decoding, resizing and normalization
//! * [`pipeline`] - The per-request prediction pipeline and the ensemble
//!   aggregator
//! * [`server`] - The axum HTTP surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nephroscan::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let registry = Arc::new(ModelRegistry::load(&config)?);
//! let pipeline = PredictionPipeline::new(registry);
//!
//! let bytes = std::fs::read("scan.jpg")?;
//! let response = pipeline.execute(&bytes, Some("scan.jpg"))?;
//! println!("{} ({:.1}%)", response.ensemble.label, response.ensemble.confidence * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod processors;
pub mod server;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use nephroscan::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        AppConfig, CLASS_NAMES, Distribution, ModelRegistry, PredictError,
    };
    pub use crate::pipeline::{ModelPrediction, PredictResponse, PredictionPipeline};
    pub use crate::processors::{InputProfile, NormalizationKind};
}

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
