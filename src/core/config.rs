//! Service configuration.
//!
//! Configuration is read once at process start from environment variables and
//! is immutable afterwards. Invalid values are fatal: the process refuses to
//! start rather than serving with a partially applied configuration.

use crate::core::errors::PredictError;
use std::path::PathBuf;

/// Default directory searched for model artifacts.
pub const DEFAULT_MODELS_DIR: &str = "models";
/// Default listening port.
pub const DEFAULT_PORT: u16 = 8000;

/// Process-wide service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory containing the three model artifacts.
    pub models_dir: PathBuf,
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Allowed CORS origins. A single `*` entry allows any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Loads the configuration from `MODELS_DIR`, `PORT` and `CORS_ORIGINS`.
    ///
    /// Unset variables fall back to defaults (`models`, `8000`, `*`).
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ConfigError`] if `PORT` is not a valid port
    /// number or `CORS_ORIGINS` is empty.
    pub fn from_env() -> Result<Self, PredictError> {
        let models_dir = std::env::var("MODELS_DIR").unwrap_or_else(|_| DEFAULT_MODELS_DIR.into());
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                PredictError::config(format!("PORT must be a valid port number, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_PORT,
        };
        let cors_origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into());

        Self::from_values(models_dir, port, &cors_origins)
    }

    /// Builds and validates a configuration from already-resolved values.
    ///
    /// # Arguments
    ///
    /// * `models_dir` - Directory containing the model artifacts.
    /// * `port` - Listening port.
    /// * `cors_origins` - Comma-separated list of allowed origins.
    pub fn from_values(
        models_dir: impl Into<PathBuf>,
        port: u16,
        cors_origins: &str,
    ) -> Result<Self, PredictError> {
        let origins: Vec<String> = cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() {
            return Err(PredictError::config(
                "CORS_ORIGINS must contain at least one origin (use '*' to allow any)",
            ));
        }

        Ok(Self {
            models_dir: models_dir.into(),
            port,
            cors_origins: origins,
        })
    }

    /// True if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
