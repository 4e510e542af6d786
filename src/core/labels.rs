//! Class label definitions for kidney CT classification.
//!
//! The label order defined here is the alignment contract for the whole
//! pipeline: raw model outputs, probability distributions, argmax indices and
//! serialized probability maps all use this order. It must never be re-sorted
//! or re-keyed anywhere downstream.

use crate::core::errors::PredictError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The fixed, ordered set of class labels shared by all registered models.
pub const CLASS_NAMES: [&str; 4] = ["Cyst", "Normal", "Stone", "Tumor"];

/// Absolute tolerance used when checking whether a score vector already sums
/// to one.
pub const DISTRIBUTION_SUM_TOLERANCE: f32 = 1e-3;

/// A probability distribution over [`CLASS_NAMES`].
///
/// Entries are non-negative and sum to 1.0 within [`DISTRIBUTION_SUM_TOLERANCE`].
/// Index `i` always refers to `CLASS_NAMES[i]`. The struct is read-only after
/// construction; every inference call derives a fresh instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution(Vec<f32>);

impl Distribution {
    /// Wraps an already-normalized score vector.
    ///
    /// # Arguments
    ///
    /// * `values` - One probability per class label, in [`CLASS_NAMES`] order.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::ShapeMismatch`] if the vector length does not
    /// match the label count.
    pub fn from_values(values: Vec<f32>) -> Result<Self, PredictError> {
        if values.len() != CLASS_NAMES.len() {
            return Err(PredictError::ShapeMismatch {
                expected: CLASS_NAMES.len(),
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Returns the underlying probabilities in label order.
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// Returns the index of the maximum probability.
    ///
    /// Ties resolve to the lowest index, so repeated runs on identical input
    /// pick the same label.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.0.iter().enumerate().skip(1) {
            if v > self.0[best] {
                best = i;
            }
        }
        best
    }

    /// Returns the winning label and its probability.
    pub fn top(&self) -> (&'static str, f32) {
        let idx = self.argmax();
        (CLASS_NAMES[idx], self.0[idx])
    }

    /// Sum of all entries, used by normalization checks.
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

/// Serializes the distribution as a label-keyed map in [`CLASS_NAMES`] order.
///
/// A plain `HashMap`/`BTreeMap` would re-key the entries; the manual impl keeps
/// the index-alignment contract visible in the JSON output.
impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in CLASS_NAMES.iter().zip(&self.0) {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_rejects_wrong_length() {
        let err = Distribution::from_values(vec![0.5, 0.5]).unwrap_err();
        match err {
            PredictError::ShapeMismatch { expected, actual } => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn argmax_breaks_ties_toward_lowest_index() {
        let dist = Distribution::from_values(vec![0.3, 0.3, 0.2, 0.2]).unwrap();
        assert_eq!(dist.argmax(), 0);
        assert_eq!(dist.top().0, "Cyst");

        let dist = Distribution::from_values(vec![0.1, 0.4, 0.4, 0.1]).unwrap();
        assert_eq!(dist.argmax(), 1);
        assert_eq!(dist.top().0, "Normal");
    }

    #[test]
    fn serializes_in_label_order() {
        let dist = Distribution::from_values(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!(json, r#"{"Cyst":0.1,"Normal":0.2,"Stone":0.3,"Tumor":0.4}"#);
    }
}
