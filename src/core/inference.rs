//! ONNX Runtime classifier integration.
//!
//! Each loaded model artifact is wrapped behind the [`Classifier`] trait, which
//! exposes a single capability: score a prepared input tensor. The production
//! implementation runs ONNX Runtime sessions; tests substitute lightweight
//! mocks. Keeping the trait surface this narrow is what lets the runner and
//! pipeline stay backend-agnostic.

use crate::core::Tensor4D;
use crate::core::errors::{PredictError, SimpleError};
use ort::{session::Session, value::TensorRef};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque loaded classifier.
///
/// Implementations must be safe to call from concurrent requests without
/// caller-side locking; if the underlying engine is not reentrant the
/// implementation serializes internally per handle.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Runs the classifier on a prepared input tensor.
    ///
    /// # Returns
    ///
    /// The raw score vector, one entry per class label in label order. The
    /// vector may or may not already be normalized; the runner applies the
    /// conditional softmax.
    fn scores(&self, input: &Tensor4D) -> Result<Vec<f32>, PredictError>;
}

/// A [`Classifier`] backed by a pool of ONNX Runtime sessions.
///
/// Sessions are selected round-robin and locked individually, so concurrent
/// requests against the same model serialize only when the pool has a single
/// session, and never serialize across different models.
#[derive(Debug)]
pub struct OrtClassifier {
    /// Pool of ONNX Runtime sessions for concurrent predictions.
    sessions: Vec<Mutex<Session>>,
    /// Next index for round-robin session selection.
    next_idx: AtomicUsize,
    /// The name of the input tensor, read from the model metadata.
    input_name: String,
    /// The name of the output tensor, read from the model metadata.
    output_name: String,
    /// The model name for error context.
    model_name: String,
    /// The path to the model file for error context.
    model_path: PathBuf,
}

impl OrtClassifier {
    /// Loads an ONNX model and builds a session pool for it.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Display name used for logging and error context.
    /// * `model_path` - Path to the ONNX model file.
    /// * `pool_size` - Number of sessions in the pool (minimum 1).
    ///
    /// # Errors
    ///
    /// Returns a [`PredictError::ConfigError`] if the file does not exist, or
    /// a session error if ONNX Runtime rejects the model.
    pub fn load(
        model_name: impl Into<String>,
        model_path: impl AsRef<Path>,
        pool_size: usize,
    ) -> Result<Self, PredictError> {
        let path = model_path.as_ref();
        let model_name = model_name.into();
        if !path.exists() {
            return Err(PredictError::config(format!(
                "missing model file for '{}': {}",
                model_name,
                path.display()
            )));
        }

        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = Session::builder()
                .and_then(|b| b.commit_from_file(path))
                .map_err(|e| {
                    PredictError::inference(
                        &model_name,
                        format!("failed to create ONNX session for {}", path.display()),
                        e,
                    )
                })?;
            sessions.push(Mutex::new(session));
        }

        // Read tensor names from the first session's metadata.
        let (input_name, output_name) = {
            let session = sessions[0]
                .lock()
                .map_err(|_| PredictError::inference_msg(&model_name, "session lock poisoned"))?;
            let input = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .ok_or_else(|| {
                    PredictError::inference_msg(&model_name, "model declares no input tensors")
                })?;
            let output = session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| {
                    PredictError::inference_msg(&model_name, "model declares no output tensors")
                })?;
            (input, output)
        };

        Ok(Self {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            output_name,
            model_name,
            model_path: path.to_path_buf(),
        })
    }

    /// Gets the path to the model file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Classifier for OrtClassifier {
    fn scores(&self, input: &Tensor4D) -> Result<Vec<f32>, PredictError> {
        let input_shape = input.shape().to_vec();
        let input_tensor = TensorRef::from_array_view(input.view()).map_err(|e| {
            PredictError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        // Round-robin select a session.
        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            PredictError::inference(
                &self.model_name,
                format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            PredictError::inference(
                &self.model_name,
                format!(
                    "ONNX Runtime forward pass failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                PredictError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        // Single-image requests only; the leading dimension, when present,
        // must be the singleton batch.
        if output_shape.len() > 1 && output_shape[0] != 1 {
            return Err(PredictError::inference_msg(
                &self.model_name,
                format!("expected batch size 1 in output shape {output_shape:?}"),
            ));
        }

        Ok(output_data.to_vec())
    }
}
