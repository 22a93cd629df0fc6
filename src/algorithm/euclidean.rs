//! Euclidean norm and distance.

use super::{Arity, ReductionAlgorithm, SumState};

/// `sqrt(sum(x^2))` over the row list.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Norm;

impl ReductionAlgorithm for L2Norm {
    type State = SumState;
    const ARITY: Arity = Arity::Unary;

    fn initialize(&self, state: &mut SumState) {
        state.sum = 0.0;
    }

    fn accumulate(&self, state: &mut SumState, x: f64, _y: f64) {
        state.sum += x * x;
    }

    fn combine(&self, source: &SumState, target: &mut SumState) {
        target.sum += source.sum;
    }

    fn finalize(&self, state: &SumState) -> f64 {
        state.sum.sqrt()
    }
}

/// `sqrt(sum((x - y)^2))` over the paired elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Distance;

impl ReductionAlgorithm for L2Distance {
    type State = SumState;
    const ARITY: Arity = Arity::Binary;

    fn initialize(&self, state: &mut SumState) {
        state.sum = 0.0;
    }

    fn accumulate(&self, state: &mut SumState, x: f64, y: f64) {
        let diff = x - y;
        state.sum += diff * diff;
    }

    fn combine(&self, source: &SumState, target: &mut SumState) {
        target.sum += source.sum;
    }

    fn finalize(&self, state: &SumState) -> f64 {
        state.sum.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SubBatch;

    #[test]
    fn test_l2norm_pythagorean() {
        let mut state = SumState::default();
        L2Norm.initialize(&mut state);
        L2Norm.accumulate(&mut state, 3.0, 0.0);
        L2Norm.accumulate(&mut state, 4.0, 0.0);
        assert_eq!(L2Norm.finalize(&state), 5.0);
    }

    #[test]
    fn test_l2distance_concrete() {
        let mut state = SumState::default();
        L2Distance.initialize(&mut state);
        L2Distance.update(&mut state, SubBatch::paired(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]));
        assert!((L2Distance.finalize(&state) - 27f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_l2distance_combine() {
        let mut left = SumState::default();
        let mut right = SumState::default();
        L2Distance.initialize(&mut left);
        L2Distance.initialize(&mut right);
        L2Distance.accumulate(&mut left, 1.0, 4.0);
        L2Distance.accumulate(&mut right, 2.0, 5.0);
        L2Distance.accumulate(&mut right, 3.0, 6.0);
        L2Distance.combine(&left, &mut right);
        assert!((L2Distance.finalize(&right) - 27f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_initialize_resets_state() {
        let mut state = SumState { sum: 42.0 };
        L2Distance.initialize(&mut state);
        assert_eq!(state.sum, 0.0);
        assert_eq!(L2Distance.finalize(&state), 0.0);
    }
}
