//! Request-level prediction pipeline.
//!
//! Orchestrates one request end to end: decode the upload, prepare one tensor
//! per distinct input profile, run every registered model, aggregate, and
//! assemble the response. Stages run strictly in order, nothing is retried,
//! and the first failure aborts the whole request; a partial response is never
//! produced.

use crate::core::Tensor4D;
use crate::core::errors::PredictError;
use crate::core::labels::Distribution;
use crate::core::registry::ModelRegistry;
use crate::pipeline::ensemble;
use crate::processors::{InputProfile, decode_image, prepare};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One model's prediction for a request.
///
/// Also used for the ensemble entry, whose `latency_ms` is the sum of the
/// constituent model latencies rather than the cost of the averaging itself.
#[derive(Debug, Clone, Serialize)]
pub struct ModelPrediction {
    /// The winning class label.
    pub label: &'static str,
    /// Probability of the winning label, the maximum of `probs`.
    pub confidence: f32,
    /// Full probability distribution, serialized as a label-keyed map.
    pub probs: Distribution,
    /// Wall-clock latency of the classifier call in milliseconds.
    pub latency_ms: f64,
    /// The `[height, width, channels]` input shape used.
    pub input_size: [u32; 3],
}

impl ModelPrediction {
    fn from_distribution(dist: Distribution, latency_ms: f64, input_size: [u32; 3]) -> Self {
        let (label, confidence) = dist.top();
        Self {
            label,
            confidence,
            probs: dist,
            latency_ms,
            input_size,
        }
    }
}

/// Lightweight request metadata echoed back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    /// Original filename as provided in the upload, if any.
    pub received_filename: String,
    /// Original image width, stringified for the wire format.
    pub orig_w: String,
    /// Original image height, stringified for the wire format.
    pub orig_h: String,
}

/// The full prediction response body.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Per-model predictions keyed by model name, in registration order.
    #[serde(serialize_with = "serialize_model_map")]
    pub models: Vec<(Arc<str>, ModelPrediction)>,
    /// The aggregated ensemble prediction.
    pub ensemble: ModelPrediction,
    /// Request metadata.
    pub metadata: ResponseMetadata,
}

/// Serializes the per-model predictions as a name-keyed map in registration
/// order. A `HashMap` would lose the stable ordering contract.
fn serialize_model_map<S: Serializer>(
    entries: &[(Arc<str>, ModelPrediction)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (name, prediction) in entries {
        map.serialize_entry(name.as_ref(), prediction)?;
    }
    map.end()
}

/// The per-request inference pipeline.
///
/// Holds only the shared registry; all per-request state lives on the stack
/// of [`PredictionPipeline::execute`] and is dropped on every exit path.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    registry: Arc<ModelRegistry>,
}

impl PredictionPipeline {
    /// Creates a pipeline over the shared model registry.
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this pipeline.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Runs the full pipeline for one uploaded image.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw uploaded bytes.
    /// * `filename` - The original filename, if the upload carried one.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::UnsupportedFormat`] for undecodable bytes and
    /// propagates inference or aggregation failures unrecovered; a single
    /// model's failure fails the whole request.
    pub fn execute(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
    ) -> Result<PredictResponse, PredictError> {
        debug!(size = bytes.len(), "decoding upload");
        let image = decode_image(bytes)?;
        let (orig_w, orig_h) = image.dimensions();

        // One tensor per distinct profile; models sharing a profile share the
        // prepared tensor.
        let mut tensors: HashMap<InputProfile, Tensor4D> = HashMap::new();
        for profile in self.registry.distinct_profiles() {
            debug!(?profile, "preparing input tensor");
            let tensor = prepare(&image, &profile)?;
            tensors.insert(profile, tensor);
        }

        let mut predictions: Vec<(Arc<str>, ModelPrediction)> = Vec::new();
        let mut distributions: Vec<Distribution> = Vec::new();
        let mut total_latency_ms = 0.0;
        for model in self.registry.models() {
            let tensor = tensors.get(model.profile()).ok_or_else(|| {
                PredictError::inference_msg(
                    model.name().as_ref(),
                    "no prepared tensor for declared input profile",
                )
            })?;
            let inference = model.run(tensor)?;
            total_latency_ms += inference.latency_ms;
            distributions.push(inference.distribution.clone());
            predictions.push((
                model.name().clone(),
                ModelPrediction::from_distribution(
                    inference.distribution,
                    inference.latency_ms,
                    model.profile().input_size(),
                ),
            ));
        }

        let mean = ensemble::aggregate(&distributions)?;
        let ensemble_input_size = self
            .registry
            .models()
            .first()
            .map(|m| m.profile().input_size())
            .unwrap_or([0, 0, 3]);
        let ensemble = ModelPrediction::from_distribution(mean, total_latency_ms, ensemble_input_size);
        debug!(label = ensemble.label, confidence = ensemble.confidence, "ensemble decision");

        Ok(PredictResponse {
            models: predictions,
            ensemble,
            metadata: ResponseMetadata {
                received_filename: filename.unwrap_or("upload").to_string(),
                orig_w: orig_w.to_string(),
                orig_h: orig_h.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::Classifier;
    use crate::core::registry::default_specs;
    use crate::core::runner::ModelRunner;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Returns fixed scores and records the shape of every input it sees.
    #[derive(Debug)]
    struct RecordingClassifier {
        scores: Vec<f32>,
        seen_shapes: Mutex<Vec<Vec<usize>>>,
    }

    impl RecordingClassifier {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                seen_shapes: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for RecordingClassifier {
        fn scores(&self, input: &Tensor4D) -> Result<Vec<f32>, PredictError> {
            self.seen_shapes
                .lock()
                .unwrap()
                .push(input.shape().to_vec());
            Ok(self.scores.clone())
        }
    }

    #[derive(Debug)]
    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn scores(&self, _input: &Tensor4D) -> Result<Vec<f32>, PredictError> {
            Err(PredictError::inference_msg("InceptionV3", "runtime fault"))
        }
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    fn test_pipeline(scores: [Vec<f32>; 3]) -> PredictionPipeline {
        let runners = default_specs()
            .into_iter()
            .zip(scores)
            .map(|(spec, s)| {
                ModelRunner::new(
                    spec.name,
                    spec.profile,
                    Box::new(RecordingClassifier::new(s)),
                )
            })
            .collect();
        PredictionPipeline::new(Arc::new(ModelRegistry::from_runners(runners).unwrap()))
    }

    #[test]
    fn end_to_end_over_a_512x512_jpeg() {
        let pipeline = test_pipeline([
            vec![0.7, 0.1, 0.1, 0.1],  // already normalized, passes through
            vec![2.0, 1.0, 1.0, 1.0],  // logits, goes through softmax
            vec![0.1, 0.2, 0.3, 0.4],  // already normalized
        ]);

        let response = pipeline
            .execute(&jpeg_bytes(512, 512), Some("scan.jpg"))
            .unwrap();

        assert_eq!(response.models.len(), 3);
        assert_eq!(response.metadata.orig_w, "512");
        assert_eq!(response.metadata.orig_h, "512");
        assert_eq!(response.metadata.received_filename, "scan.jpg");

        for (_, prediction) in &response.models {
            assert_eq!(prediction.input_size, [299, 299, 3]);
            assert!((prediction.probs.sum() - 1.0).abs() < 1e-3);
            // confidence is the max entry and the label is its argmax
            let max = prediction
                .probs
                .values()
                .iter()
                .cloned()
                .fold(f32::NEG_INFINITY, f32::max);
            assert!((prediction.confidence - max).abs() < 1e-6);
            assert_eq!(
                prediction.label,
                crate::core::labels::CLASS_NAMES[prediction.probs.argmax()]
            );
        }

        // Ensemble probs equal the element-wise mean of the per-model probs.
        for i in 0..4 {
            let mean: f32 = response
                .models
                .iter()
                .map(|(_, p)| p.probs.values()[i])
                .sum::<f32>()
                / 3.0;
            assert!((response.ensemble.probs.values()[i] - mean).abs() < 1e-6);
        }

        // Ensemble latency is the sum of the constituent latencies.
        let total: f64 = response.models.iter().map(|(_, p)| p.latency_ms).sum();
        assert!((response.ensemble.latency_ms - total).abs() < 1e-9);
    }

    /// Shares a [`RecordingClassifier`] so the test can inspect what each
    /// registered model actually received.
    #[derive(Debug, Clone)]
    struct SharedClassifier(Arc<RecordingClassifier>);

    impl Classifier for SharedClassifier {
        fn scores(&self, input: &Tensor4D) -> Result<Vec<f32>, PredictError> {
            self.0.scores(input)
        }
    }

    #[test]
    fn every_model_sees_a_batched_299_tensor() {
        let uniform = vec![0.25, 0.25, 0.25, 0.25];
        let handles: Vec<Arc<RecordingClassifier>> = (0..3)
            .map(|_| Arc::new(RecordingClassifier::new(uniform.clone())))
            .collect();
        let runners = default_specs()
            .into_iter()
            .zip(&handles)
            .map(|(spec, handle)| {
                ModelRunner::new(
                    spec.name,
                    spec.profile,
                    Box::new(SharedClassifier(Arc::clone(handle))),
                )
            })
            .collect();
        let pipeline =
            PredictionPipeline::new(Arc::new(ModelRegistry::from_runners(runners).unwrap()));

        pipeline.execute(&jpeg_bytes(640, 480), None).unwrap();

        for handle in &handles {
            let shapes = handle.seen_shapes.lock().unwrap();
            assert_eq!(shapes.as_slice(), &[vec![1, 299, 299, 3]]);
        }
    }

    #[test]
    fn undecodable_bytes_abort_before_inference() {
        let pipeline = test_pipeline([
            vec![0.25, 0.25, 0.25, 0.25],
            vec![0.25, 0.25, 0.25, 0.25],
            vec![0.25, 0.25, 0.25, 0.25],
        ]);
        assert!(matches!(
            pipeline.execute(b"not an image", None),
            Err(PredictError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn one_failing_model_fails_the_whole_request() {
        let specs = default_specs();
        let runners = vec![
            ModelRunner::new(
                specs[0].name,
                specs[0].profile,
                Box::new(RecordingClassifier::new(vec![0.7, 0.1, 0.1, 0.1])),
            ),
            ModelRunner::new(
                specs[1].name,
                specs[1].profile,
                Box::new(RecordingClassifier::new(vec![0.25, 0.25, 0.25, 0.25])),
            ),
            ModelRunner::new(specs[2].name, specs[2].profile, Box::new(FailingClassifier)),
        ];
        let pipeline =
            PredictionPipeline::new(Arc::new(ModelRegistry::from_runners(runners).unwrap()));

        assert!(matches!(
            pipeline.execute(&jpeg_bytes(64, 64), None),
            Err(PredictError::Inference { .. })
        ));
    }

    #[test]
    fn tie_breaks_are_reproducible_across_runs() {
        let pipeline = test_pipeline([
            vec![0.4, 0.4, 0.1, 0.1],
            vec![0.4, 0.4, 0.1, 0.1],
            vec![0.4, 0.4, 0.1, 0.1],
        ]);
        let bytes = jpeg_bytes(128, 128);
        for _ in 0..3 {
            let response = pipeline.execute(&bytes, None).unwrap();
            assert_eq!(response.ensemble.label, "Cyst");
        }
    }

    #[test]
    fn response_json_preserves_registration_and_label_order() {
        let pipeline = test_pipeline([
            vec![0.7, 0.1, 0.1, 0.1],
            vec![0.1, 0.7, 0.1, 0.1],
            vec![0.1, 0.1, 0.7, 0.1],
        ]);
        let response = pipeline.execute(&jpeg_bytes(32, 32), None).unwrap();
        let json = serde_json::to_string(&response).unwrap();

        let vgg = json.find("\"VGG19\"").unwrap();
        let resnet = json.find("\"ResNet50\"").unwrap();
        let inception = json.find("\"InceptionV3\"").unwrap();
        assert!(vgg < resnet && resnet < inception);

        let cyst = json.find("\"Cyst\"").unwrap();
        let normal = json.find("\"Normal\"").unwrap();
        assert!(cyst < normal);
    }
}
