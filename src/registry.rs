//! Algorithm registry and resolved descriptors.
//!
//! The registry is an explicit value: build it once per session (usually with
//! [`AlgorithmRegistry::with_builtins`]) and pass it by reference to whatever
//! binds `list_distance` calls. Resolution happens at plan time, so unknown
//! names never reach the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::algorithm::{
    Arity, CosineDistance, CosineSimilarity, DotProduct, L2Distance, L2Norm, Reduction,
    SubBatch,
};
use crate::error::{DistanceError, Result};

/// An algorithm bound to the name it was resolved under.
///
/// Cheap to clone; the implementation is shared.
#[derive(Clone)]
pub struct AlgorithmDescriptor {
    name: String,
    algorithm: Arc<dyn Reduction>,
}

impl AlgorithmDescriptor {
    /// Creates a descriptor for `algorithm` under `name`.
    pub fn new(name: impl Into<String>, algorithm: Arc<dyn Reduction>) -> Self {
        AlgorithmDescriptor {
            name: name.into(),
            algorithm,
        }
    }

    /// Returns the name the descriptor was resolved under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the algorithm reads the query vector.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.algorithm.arity()
    }

    /// Returns the byte size of one accumulator.
    #[must_use]
    pub fn state_size(&self) -> usize {
        self.algorithm.state_size()
    }

    /// Returns the underlying implementation.
    #[must_use]
    pub fn algorithm(&self) -> &dyn Reduction {
        self.algorithm.as_ref()
    }

    /// Reduces one pair of dense slices in a single pass.
    ///
    /// Binary algorithms pair elements up to the shorter of the two slices.
    /// `rhs` is ignored by unary algorithms.
    #[must_use]
    pub fn compute(&self, lhs: &[f64], rhs: &[f64]) -> f64 {
        let batch = match self.arity() {
            Arity::Unary => SubBatch::unary(lhs),
            Arity::Binary => {
                let len = lhs.len().min(rhs.len());
                SubBatch::paired(&lhs[..len], &rhs[..len])
            }
        };
        self.algorithm.reduce(&mut std::iter::once(batch))
    }
}

impl fmt::Debug for AlgorithmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("state_size", &self.state_size())
            .finish()
    }
}

/// The algorithm-name argument of a `list_distance` call, as seen by the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarArgument {
    /// A constant string.
    Literal(String),
    /// A constant NULL.
    Null,
    /// A per-row value read from the named column.
    Column(String),
}

/// Name to algorithm mapping.
///
/// Names are case-insensitive. Aliases resolve to the same implementation but
/// keep their own name in the descriptor.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<String, Arc<dyn Reduction>>,
}

impl AlgorithmRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in algorithms.
    ///
    /// `euclidean_distance` is registered as an alias of `l2distance`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut algorithms: BTreeMap<String, Arc<dyn Reduction>> = BTreeMap::new();
        algorithms.insert("l2norm".into(), Arc::new(L2Norm));
        let l2distance: Arc<dyn Reduction> = Arc::new(L2Distance);
        algorithms.insert("l2distance".into(), Arc::clone(&l2distance));
        algorithms.insert("euclidean_distance".into(), l2distance);
        algorithms.insert("dot_product".into(), Arc::new(DotProduct));
        algorithms.insert("cosine_distance".into(), Arc::new(CosineDistance));
        algorithms.insert("cosine_similarity".into(), Arc::new(CosineSimilarity));
        AlgorithmRegistry { algorithms }
    }

    /// Registers `algorithm` under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already registered.
    pub fn register(&mut self, name: &str, algorithm: Arc<dyn Reduction>) -> Result<()> {
        let key = normalize(name);
        if key.is_empty() {
            return Err(DistanceError::InvalidArgument(
                "Algorithm name cannot be empty".into(),
            ));
        }
        if self.algorithms.contains_key(&key) {
            return Err(DistanceError::DuplicateAlgorithm(key));
        }
        debug!(name = %key, arity = ?algorithm.arity(), "registered distance algorithm");
        self.algorithms.insert(key, algorithm);
        Ok(())
    }

    /// Registers `alias` as another name for the algorithm behind `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is unknown or `alias` is taken.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let algorithm = self.lookup(target)?;
        self.register(alias, algorithm)
    }

    /// Resolves `name` to a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::UnknownAlgorithm`] if nothing is registered
    /// under `name`.
    pub fn resolve(&self, name: &str) -> Result<AlgorithmDescriptor> {
        let algorithm = self.lookup(name)?;
        let descriptor = AlgorithmDescriptor::new(normalize(name), algorithm);
        debug!(
            name = descriptor.name(),
            arity = ?descriptor.arity(),
            state_size = descriptor.state_size(),
            "resolved distance algorithm"
        );
        Ok(descriptor)
    }

    /// Resolves the algorithm-name argument of a call.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::NonConstantAlgorithmName`] unless the argument
    /// is a string literal, and [`DistanceError::UnknownAlgorithm`] if the
    /// literal names no registered algorithm.
    pub fn resolve_argument(&self, argument: &ScalarArgument) -> Result<AlgorithmDescriptor> {
        match argument {
            ScalarArgument::Literal(name) => self.resolve(name),
            ScalarArgument::Null => Err(DistanceError::NonConstantAlgorithmName(
                "NULL is not an algorithm name".into(),
            )),
            ScalarArgument::Column(column) => Err(DistanceError::NonConstantAlgorithmName(
                format!("got column reference '{column}'"),
            )),
        }
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.algorithms.contains_key(&normalize(name))
    }

    /// Returns all registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// Returns the number of registered names, aliases included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Reduction>> {
        self.algorithms
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| DistanceError::UnknownAlgorithm {
                name: name.to_string(),
            })
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
