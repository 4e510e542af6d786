//! Ensemble aggregation.
//!
//! Combines the per-model probability distributions into one consensus
//! distribution by unweighted position-wise arithmetic mean. There is no
//! weighting and no trained combiner; the ensemble is purely an average of
//! its members.

use crate::core::errors::PredictError;
use crate::core::labels::{CLASS_NAMES, Distribution};

/// Averages the input distributions position-wise.
///
/// Index `i` of the output is the mean of index `i` across all inputs, so the
/// result is itself a valid distribution whenever the inputs are. The
/// operation is order-independent and the identity for a single input.
///
/// # Errors
///
/// Returns [`PredictError::ShapeMismatch`] if the input list is empty. Length
/// mismatches between members cannot occur because [`Distribution`] enforces
/// the label count at construction.
pub fn aggregate(distributions: &[Distribution]) -> Result<Distribution, PredictError> {
    if distributions.is_empty() {
        return Err(PredictError::ShapeMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let count = distributions.len() as f32;
    let mut mean = vec![0.0f32; CLASS_NAMES.len()];
    for dist in distributions {
        for (slot, &value) in mean.iter_mut().zip(dist.values()) {
            *slot += value;
        }
    }
    for slot in &mut mean {
        *slot /= count;
    }

    Distribution::from_values(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(values: [f32; 4]) -> Distribution {
        Distribution::from_values(values.to_vec()).unwrap()
    }

    #[test]
    fn single_input_is_identity() {
        let input = dist([0.1, 0.2, 0.3, 0.4]);
        let output = aggregate(std::slice::from_ref(&input)).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn mean_is_position_wise() {
        let output = aggregate(&[
            dist([1.0, 0.0, 0.0, 0.0]),
            dist([0.0, 1.0, 0.0, 0.0]),
            dist([0.0, 0.0, 1.0, 0.0]),
        ])
        .unwrap();
        let want = [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0];
        for (got, want) in output.values().iter().zip(want) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn aggregation_is_order_independent() {
        let a = dist([0.7, 0.1, 0.1, 0.1]);
        let b = dist([0.2, 0.5, 0.2, 0.1]);
        let c = dist([0.1, 0.1, 0.6, 0.2]);

        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let reversed = aggregate(&[c, b, a]).unwrap();
        for (x, y) in forward.values().iter().zip(reversed.values()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn mean_of_distributions_sums_to_one() {
        let output = aggregate(&[
            dist([0.25, 0.25, 0.25, 0.25]),
            dist([0.4, 0.3, 0.2, 0.1]),
        ])
        .unwrap();
        assert!((output.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_input_is_a_contract_violation() {
        assert!(matches!(
            aggregate(&[]),
            Err(PredictError::ShapeMismatch { .. })
        ));
    }
}
