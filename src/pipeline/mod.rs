//! Request orchestration: the prediction pipeline and the ensemble aggregator.

pub mod ensemble;
pub mod predict;

pub use ensemble::aggregate;
pub use predict::{ModelPrediction, PredictResponse, PredictionPipeline, ResponseMetadata};
