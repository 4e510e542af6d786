//! HTTP surface of the prediction service.
//!
//! Thin transport glue over the prediction pipeline: a readiness route, the
//! multipart upload route and the error-to-status mapping. CPU-bound work
//! (decode and inference) runs on the blocking thread pool so concurrent
//! requests are not stalled behind each other on the async executor.

use crate::core::config::AppConfig;
use crate::core::errors::PredictError;
use crate::core::labels::CLASS_NAMES;
use crate::core::registry::ModelRegistry;
use crate::pipeline::{PredictResponse, PredictionPipeline};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Maximum accepted upload size in bytes. CT exports are a few megabytes;
/// this leaves generous headroom without allowing unbounded bodies.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// An error response with a status code and a client-safe detail message.
///
/// Internal faults are logged with their full source chain but reach the
/// client only as a generic message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match &err {
            PredictError::UnsupportedFormat(source) => {
                warn!(%source, "rejected undecodable upload");
                Self {
                    status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    detail: "Unsupported image format".to_string(),
                }
            }
            PredictError::MissingFile => Self::bad_request("No file uploaded"),
            _ => {
                error!(error = %err, "prediction request failed");
                Self::internal("Prediction failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Builds the application router with CORS applied.
///
/// # Errors
///
/// Returns [`PredictError::ConfigError`] if a configured CORS origin is not a
/// valid header value.
pub fn build_router(registry: Arc<ModelRegistry>, config: &AppConfig) -> Result<Router, PredictError> {
    let pipeline = PredictionPipeline::new(registry);
    let router = Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer(config)?)
        .with_state(pipeline);
    Ok(router)
}

/// Builds the CORS layer from the configured origin list.
///
/// Credentials are only allowed for an explicit origin list; combining them
/// with a wildcard is rejected by browsers and by tower-http.
fn cors_layer(config: &AppConfig) -> Result<CorsLayer, PredictError> {
    if config.allows_any_origin() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                PredictError::config(format!("invalid CORS origin '{origin}'"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Readiness and introspection route.
async fn root(State(pipeline): State<PredictionPipeline>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "models": pipeline.registry().model_names(),
        "classes": CLASS_NAMES,
    }))
}

/// Prediction route: accepts a multipart upload with a `file` field and runs
/// the full pipeline on it.
async fn predict(
    State(pipeline): State<PredictionPipeline>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::from(PredictError::MissingFile))?;

    // Decode and inference are CPU-bound; run them off the async executor.
    let response = tokio::task::spawn_blocking(move || {
        pipeline.execute(&bytes, filename.as_deref())
    })
    .await
    .map_err(|e| {
        error!(error = %e, "prediction task panicked or was cancelled");
        ApiError::internal("Prediction failed")
    })??;

    Ok(Json(response))
}
