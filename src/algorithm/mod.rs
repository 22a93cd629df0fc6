//! Reduction algorithms.
//!
//! An algorithm is a fold over the paired elements of one row and the query
//! vector: `initialize` an accumulator, `accumulate` every pair, optionally
//! `combine` partial accumulators, then `finalize` to a scalar. Algorithms own
//! only the math. Chunking, null handling and output assembly belong to the
//! engine.

mod cosine;
mod euclidean;
mod inner_product;

use std::fmt::Debug;
use std::mem::size_of;

pub use cosine::{CosineDistance, CosineSimilarity, CosineState};
pub use euclidean::{L2Distance, L2Norm};
pub use inner_product::DotProduct;

/// Number of list arguments an algorithm consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Reads only the row list (e.g. `l2norm`).
    Unary,
    /// Pairs the row list with the query vector element by element.
    Binary,
}

impl Arity {
    /// Returns the number of list arguments.
    #[must_use]
    pub fn arg_count(self) -> usize {
        match self {
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }
}

/// Single running sum, used by every non-cosine built-in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SumState {
    /// Accumulated value.
    pub sum: f64,
}

/// A bounded-width slice of one row's paired elements.
///
/// `lhs` comes from the row list and `rhs` from the query vector at the same
/// ordinals. `rhs` is `None` for unary algorithms.
#[derive(Debug, Clone, Copy)]
pub struct SubBatch<'a> {
    /// Row list elements.
    pub lhs: &'a [f64],
    /// Query vector elements, same length as `lhs`.
    pub rhs: Option<&'a [f64]>,
}

impl<'a> SubBatch<'a> {
    /// Creates a sub-batch pairing `lhs` with `rhs`.
    #[must_use]
    pub fn paired(lhs: &'a [f64], rhs: &'a [f64]) -> Self {
        debug_assert_eq!(lhs.len(), rhs.len());
        SubBatch {
            lhs,
            rhs: Some(rhs),
        }
    }

    /// Creates a sub-batch with only row elements.
    #[must_use]
    pub fn unary(lhs: &'a [f64]) -> Self {
        SubBatch { lhs, rhs: None }
    }

    /// Returns the number of element pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lhs.len()
    }

    /// Returns true if the sub-batch holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lhs.is_empty()
    }
}

/// A distance or similarity formula expressed as a fold.
///
/// Implementations must keep `combine` consistent with `accumulate`: splitting
/// a row into several partial states and combining them has to give the same
/// result (up to floating-point rounding) as one sequential pass.
pub trait ReductionAlgorithm: Debug + Send + Sync + 'static {
    /// Per-row accumulator.
    type State: Copy + Default + Debug + Send;

    /// Whether the algorithm reads the query vector.
    const ARITY: Arity;

    /// Resets `state` to the identity value.
    fn initialize(&self, state: &mut Self::State);

    /// Folds one element pair into `state`. `y` is `0.0` for unary algorithms.
    fn accumulate(&self, state: &mut Self::State, x: f64, y: f64);

    /// Merges the partial `source` into `target`.
    fn combine(&self, source: &Self::State, target: &mut Self::State);

    /// Produces the output scalar.
    fn finalize(&self, state: &Self::State) -> f64;

    /// Folds every pair of a sub-batch into `state`.
    fn update(&self, state: &mut Self::State, batch: SubBatch<'_>) {
        match batch.rhs {
            Some(rhs) => {
                for (&x, &y) in batch.lhs.iter().zip(rhs) {
                    self.accumulate(state, x, y);
                }
            }
            None => {
                for &x in batch.lhs {
                    self.accumulate(state, x, 0.0);
                }
            }
        }
    }
}

/// Object-safe view of a [`ReductionAlgorithm`].
///
/// The registry stores algorithms behind `Arc<dyn Reduction>` so that the
/// formula is chosen once at plan time. Each call owns its accumulator state
/// on the stack; nothing survives the call.
pub trait Reduction: Debug + Send + Sync {
    /// Number of list arguments.
    fn arity(&self) -> Arity;

    /// Size in bytes of one accumulator.
    fn state_size(&self) -> usize;

    /// Threads a single accumulator through `batches` in order and finalizes it.
    fn reduce<'a>(&self, batches: &mut dyn Iterator<Item = SubBatch<'a>>) -> f64;

    /// Accumulates each sub-batch into its own partial state and merges the
    /// partials with `combine` before finalizing.
    fn reduce_partitioned<'a>(&self, batches: &mut dyn Iterator<Item = SubBatch<'a>>) -> f64;
}

impl<A: ReductionAlgorithm> Reduction for A {
    fn arity(&self) -> Arity {
        A::ARITY
    }

    fn state_size(&self) -> usize {
        size_of::<A::State>()
    }

    fn reduce<'a>(&self, batches: &mut dyn Iterator<Item = SubBatch<'a>>) -> f64 {
        let mut state = A::State::default();
        self.initialize(&mut state);
        for batch in batches {
            self.update(&mut state, batch);
        }
        self.finalize(&state)
    }

    fn reduce_partitioned<'a>(&self, batches: &mut dyn Iterator<Item = SubBatch<'a>>) -> f64 {
        let mut total = A::State::default();
        self.initialize(&mut total);
        for batch in batches {
            let mut partial = A::State::default();
            self.initialize(&mut partial);
            self.update(&mut partial, batch);
            self.combine(&partial, &mut total);
        }
        self.finalize(&total)
    }
}
