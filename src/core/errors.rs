//! Error types for the prediction service.
//!
//! This module defines the error taxonomy shared by the decoding, preprocessing,
//! inference and aggregation stages, together with utility constructors for
//! attaching context. The HTTP layer maps these variants onto status codes; no
//! variant ever carries internal state that should reach a client.

use thiserror::Error;

/// Enum representing the errors that can occur while serving a prediction.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The uploaded bytes could not be decoded as a supported raster image.
    #[error("unsupported image format")]
    UnsupportedFormat(#[source] image::ImageError),

    /// The multipart request did not carry a `file` field.
    #[error("no file uploaded")]
    MissingFile,

    /// A classifier call failed during inference.
    #[error("inference failed for model '{model}': {context}")]
    Inference {
        /// Name of the model whose call failed.
        model: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A score vector did not match the class label count.
    ///
    /// This is a programming-contract violation, not a recoverable user error.
    #[error("score vector length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// The expected vector length (the class label count).
        expected: usize,
        /// The actual vector length.
        actual: usize,
    },

    /// Error indicating a configuration or startup problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred during image preprocessing.
    #[error("preprocessing failed: {context}")]
    Processing {
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl PredictError {
    /// Creates a PredictError for a failed classifier call.
    ///
    /// # Arguments
    ///
    /// * `model` - The name of the model whose call failed.
    /// * `context` - Additional context about the failure.
    /// * `source` - The underlying error.
    pub fn inference(
        model: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.into(),
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a PredictError for a failed classifier call without an
    /// underlying source error.
    pub fn inference_msg(model: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Inference {
            model: model.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates a PredictError for configuration errors.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a PredictError for preprocessing failures.
    pub fn processing(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// True if the error was caused by the client's input rather than an
    /// internal fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::UnsupportedFormat(_) | PredictError::MissingFile
        )
    }
}

/// A minimal string-backed error for wrapping plain messages as error sources.
#[derive(Debug)]
pub struct SimpleError(String);

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimpleError {}
