//! Dot product.

use super::{Arity, ReductionAlgorithm, SumState};

/// `sum(x * y)` over the paired elements. The empty product is `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProduct;

impl ReductionAlgorithm for DotProduct {
    type State = SumState;
    const ARITY: Arity = Arity::Binary;

    fn initialize(&self, state: &mut SumState) {
        state.sum = 0.0;
    }

    fn accumulate(&self, state: &mut SumState, x: f64, y: f64) {
        state.sum += x * y;
    }

    fn combine(&self, source: &SumState, target: &mut SumState) {
        target.sum += source.sum;
    }

    fn finalize(&self, state: &SumState) -> f64 {
        state.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SubBatch;

    #[test]
    fn test_dot_product_concrete() {
        let mut state = SumState::default();
        DotProduct.initialize(&mut state);
        DotProduct.update(&mut state, SubBatch::paired(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]));
        assert_eq!(DotProduct.finalize(&state), 32.0);
    }

    #[test]
    fn test_dot_product_orthogonal() {
        let mut state = SumState::default();
        DotProduct.initialize(&mut state);
        DotProduct.update(&mut state, SubBatch::paired(&[1.0, 0.0], &[0.0, 1.0]));
        assert_eq!(DotProduct.finalize(&state), 0.0);
    }

    #[test]
    fn test_dot_product_negative() {
        let mut state = SumState::default();
        DotProduct.initialize(&mut state);
        DotProduct.update(&mut state, SubBatch::paired(&[-1.0, 2.0], &[3.0, -4.0]));
        assert_eq!(DotProduct.finalize(&state), -11.0);
    }
}
