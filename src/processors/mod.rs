//! Image processing stages: upload decoding, resizing and normalization.

pub mod decode;
pub mod normalization;
pub mod preprocess;

pub use decode::decode_image;
pub use normalization::{NormalizationKind, NormalizeImage};
pub use preprocess::{InputProfile, prepare};
