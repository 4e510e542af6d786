//! Process-wide model registry.
//!
//! The registry is populated once at startup and read-only afterwards; it is
//! the only state shared across requests. Each entry pairs a loaded classifier
//! with its declared input profile, in a fixed registration order so that
//! per-model logging and response assembly stay deterministic.

use crate::core::config::AppConfig;
use crate::core::errors::PredictError;
use crate::core::inference::OrtClassifier;
use crate::core::runner::ModelRunner;
use crate::processors::{InputProfile, NormalizationKind};
use std::path::PathBuf;
use tracing::info;

/// Declaration of one model artifact: display name, file name and input
/// contract.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Display name used in responses and logs.
    pub name: &'static str,
    /// Artifact file name inside the models directory.
    pub file_name: &'static str,
    /// The input shape and normalization the model was trained with.
    pub profile: InputProfile,
}

/// The three classifiers this service ensembles, in registration order.
///
/// VGG19 and ResNet50 share the scale-to-unit profile; InceptionV3 uses the
/// Inception convention. All three were trained at 299x299.
pub fn default_specs() -> [ModelSpec; 3] {
    [
        ModelSpec {
            name: "VGG19",
            file_name: "vgg19_kidney_model.onnx",
            profile: InputProfile::new(299, 299, NormalizationKind::ScaleToUnit),
        },
        ModelSpec {
            name: "ResNet50",
            file_name: "final_resnet50_model.onnx",
            profile: InputProfile::new(299, 299, NormalizationKind::ScaleToUnit),
        },
        ModelSpec {
            name: "InceptionV3",
            file_name: "inception_v3_kidney_model.onnx",
            profile: InputProfile::new(299, 299, NormalizationKind::Inception),
        },
    ]
}

/// The set of loaded models, immutable after startup.
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelRunner>,
}

impl ModelRegistry {
    /// Loads all registered model artifacts from the configured directory.
    ///
    /// All paths are checked before any session is created, so a missing
    /// artifact fails startup immediately instead of after an expensive load.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ConfigError`] if any artifact is missing, or an
    /// inference error if ONNX Runtime rejects one of the models. Both are
    /// fatal for process startup.
    pub fn load(config: &AppConfig) -> Result<Self, PredictError> {
        let specs = default_specs();

        let paths: Vec<PathBuf> = specs
            .iter()
            .map(|spec| config.models_dir.join(spec.file_name))
            .collect();
        for (spec, path) in specs.iter().zip(&paths) {
            if !path.exists() {
                return Err(PredictError::config(format!(
                    "missing model file for '{}': {}",
                    spec.name,
                    path.display()
                )));
            }
        }

        info!("loading {} model artifacts (this may take a while)", specs.len());
        let mut models = Vec::with_capacity(specs.len());
        for (spec, path) in specs.iter().zip(&paths) {
            let classifier = OrtClassifier::load(spec.name, path, 1)?;
            info!(model = spec.name, path = %path.display(), "model loaded");
            models.push(ModelRunner::new(spec.name, spec.profile, Box::new(classifier)));
        }

        Ok(Self { models })
    }

    /// Builds a registry from already-constructed runners.
    ///
    /// Used by tests to register mock classifiers without model files.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ConfigError`] if the runner list is empty.
    pub fn from_runners(models: Vec<ModelRunner>) -> Result<Self, PredictError> {
        if models.is_empty() {
            return Err(PredictError::config(
                "model registry must contain at least one model",
            ));
        }
        Ok(Self { models })
    }

    /// The registered models in registration order.
    pub fn models(&self) -> &[ModelRunner] {
        &self.models
    }

    /// Display names of the registered models, in registration order.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name().as_ref()).collect()
    }

    /// The distinct input profiles required by the registered models,
    /// preserving first-seen order.
    pub fn distinct_profiles(&self) -> Vec<InputProfile> {
        let mut profiles: Vec<InputProfile> = Vec::new();
        for model in &self.models {
            if !profiles.contains(model.profile()) {
                profiles.push(*model.profile());
            }
        }
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Tensor4D;
    use crate::core::inference::Classifier;

    #[derive(Debug)]
    struct NoopClassifier;

    impl Classifier for NoopClassifier {
        fn scores(&self, _input: &Tensor4D) -> Result<Vec<f32>, PredictError> {
            Ok(vec![0.25, 0.25, 0.25, 0.25])
        }
    }

    #[test]
    fn default_specs_fix_the_registration_order() {
        let specs = default_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name).collect();
        assert_eq!(names, ["VGG19", "ResNet50", "InceptionV3"]);
    }

    #[test]
    fn missing_artifact_fails_startup() {
        let config = AppConfig::from_values("/nonexistent-models-dir", 8000, "*").unwrap();
        let err = ModelRegistry::load(&config).unwrap_err();
        assert!(matches!(err, PredictError::ConfigError { .. }));
        assert!(err.to_string().contains("VGG19"));
    }

    #[test]
    fn distinct_profiles_dedupe_preserving_order() {
        let registry = ModelRegistry::from_runners(
            default_specs()
                .into_iter()
                .map(|spec| ModelRunner::new(spec.name, spec.profile, Box::new(NoopClassifier)))
                .collect(),
        )
        .unwrap();

        let profiles = registry.distinct_profiles();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].normalization, NormalizationKind::ScaleToUnit);
        assert_eq!(profiles[1].normalization, NormalizationKind::Inception);
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(ModelRegistry::from_runners(Vec::new()).is_err());
    }
}
