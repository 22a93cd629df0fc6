//! Cosine similarity and distance.
//!
//! Both formulas share one accumulator: the dot product and the squared
//! magnitudes of each side. A zero magnitude on either side divides by zero
//! and the result is NaN; it is not reported as an error.

use super::{Arity, ReductionAlgorithm};

/// Accumulator for the cosine family.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CosineState {
    /// Running `sum(x * y)`.
    pub dot_product: f64,
    /// Running `sum(x^2)` over the row list.
    pub a_magnitude: f64,
    /// Running `sum(y^2)` over the query vector.
    pub b_magnitude: f64,
}

impl CosineState {
    fn reset(&mut self) {
        *self = CosineState::default();
    }

    fn add(&mut self, x: f64, y: f64) {
        self.dot_product += x * y;
        self.a_magnitude += x * x;
        self.b_magnitude += y * y;
    }

    fn merge(&mut self, other: &CosineState) {
        self.dot_product += other.dot_product;
        self.a_magnitude += other.a_magnitude;
        self.b_magnitude += other.b_magnitude;
    }

    fn similarity(&self) -> f64 {
        self.dot_product / (self.a_magnitude * self.b_magnitude).sqrt()
    }
}

/// `dot / sqrt(|a|^2 * |b|^2)`, in `[-1, 1]` for non-zero inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl ReductionAlgorithm for CosineSimilarity {
    type State = CosineState;
    const ARITY: Arity = Arity::Binary;

    fn initialize(&self, state: &mut CosineState) {
        state.reset();
    }

    fn accumulate(&self, state: &mut CosineState, x: f64, y: f64) {
        state.add(x, y);
    }

    fn combine(&self, source: &CosineState, target: &mut CosineState) {
        target.merge(source);
    }

    fn finalize(&self, state: &CosineState) -> f64 {
        state.similarity()
    }
}

/// `1 - cosine_similarity`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl ReductionAlgorithm for CosineDistance {
    type State = CosineState;
    const ARITY: Arity = Arity::Binary;

    fn initialize(&self, state: &mut CosineState) {
        state.reset();
    }

    fn accumulate(&self, state: &mut CosineState, x: f64, y: f64) {
        state.add(x, y);
    }

    fn combine(&self, source: &CosineState, target: &mut CosineState) {
        target.merge(source);
    }

    fn finalize(&self, state: &CosineState) -> f64 {
        1.0 - state.similarity()
    }
}
