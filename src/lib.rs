//! listdist - batched list distance kernels
//!
//! Computes one distance or similarity score per row of an Arrow list column
//! against a broadcast query vector. The scoring formula is resolved by name
//! once, at plan time, through an [`AlgorithmRegistry`]; the
//! [`ReductionEngine`] then evaluates it over any number of batches.
//!
//! ```
//! use listdist::{AlgorithmRegistry, ListColumn, QueryVector, ReductionEngine};
//!
//! let registry = AlgorithmRegistry::with_builtins();
//! let l2 = registry.resolve("l2distance").unwrap();
//!
//! let rows = ListColumn::from_rows(vec![Some(vec![Some(1.0), Some(2.0), Some(3.0)]), None]);
//! let query = QueryVector::new(vec![4.0, 5.0, 6.0]);
//!
//! let result = ReductionEngine::default().evaluate(&rows, &query, &l2);
//! assert!((result.value(0) - 27f64.sqrt()).abs() < 1e-12);
//! assert!(arrow::array::Array::is_null(&result, 1));
//! ```

pub mod algorithm;
pub mod engine;
pub mod error;
pub mod registry;

pub use algorithm::{Arity, Reduction, ReductionAlgorithm, SubBatch};
pub use engine::{
    EngineConfig, LengthPolicy, ListColumn, ListRow, NullElementPolicy, QueryVector,
    ReductionEngine,
};
pub use error::{DistanceError, Result};
pub use registry::{AlgorithmDescriptor, AlgorithmRegistry, ScalarArgument};
