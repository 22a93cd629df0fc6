//! Batched reduction engine.
//!
//! The engine walks a column of ragged lists, pairs each row with the
//! broadcast query vector, and reduces every row to one scalar with the
//! algorithm resolved at plan time. It owns chunking and null semantics; the
//! algorithm only sees dense sub-batches of `f64` pairs.

mod column;
mod config;
mod sub_batch;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::algorithm::{Arity, Reduction};
use crate::error::{DistanceError, Result};
use crate::registry::AlgorithmDescriptor;

pub use column::{ListColumn, ListRow, QueryVector};
pub use config::{
    EngineConfig, LengthPolicy, NullElementPolicy, DEFAULT_PARALLEL_ROW_THRESHOLD,
    DEFAULT_SUB_BATCH_WIDTH,
};

use sub_batch::{Scratch, SubBatches};

/// Evaluates `list_distance`-style reductions over list columns.
///
/// The engine keeps no state between calls. Each call owns its scratch
/// buffers, and every row gets a fresh accumulator.
#[derive(Debug, Clone, Default)]
pub struct ReductionEngine {
    config: EngineConfig,
}

impl ReductionEngine {
    /// Creates an engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reduces every row of `rows` against `query`.
    ///
    /// The result has one entry per input row, in input order. A null query
    /// or a null row produces null. An empty row is still initialized and
    /// finalized, so it yields the algorithm's identity-derived value (0 for
    /// sums, NaN for the cosine family).
    #[must_use]
    #[instrument(skip_all, fields(algorithm = algorithm.name(), rows = rows.len()))]
    pub fn evaluate(
        &self,
        rows: &ListColumn,
        query: &QueryVector,
        algorithm: &AlgorithmDescriptor,
    ) -> Float64Array {
        let Some(query) = query.as_row() else {
            debug!("query vector is null, emitting all-null result");
            return Float64Array::new_null(rows.len());
        };

        let parallel = self.config.parallel && rows.len() >= self.config.parallel_row_threshold;
        debug!(
            parallel,
            sub_batch_width = self.config.sub_batch_width,
            null_rows = rows.null_count(),
            elements = rows.element_count(),
            query_len = query.len(),
            "evaluating batch"
        );

        let results: Vec<Option<f64>> = if parallel {
            (0..rows.len())
                .into_par_iter()
                .map_init(Scratch::default, |scratch, index| {
                    self.reduce_row(rows, index, query, algorithm, scratch)
                })
                .collect()
        } else {
            let mut scratch = Scratch::default();
            (0..rows.len())
                .map(|index| self.reduce_row(rows, index, query, algorithm, &mut scratch))
                .collect()
        };
        Float64Array::from(results)
    }

    /// Reduces a list array against a single-row query array.
    ///
    /// # Errors
    ///
    /// Returns an error if either array is not a list of numbers, or if the
    /// query does not hold exactly one row. These checks run before any row
    /// is reduced.
    pub fn evaluate_arrays(
        &self,
        list: &dyn Array,
        query: &dyn Array,
        algorithm: &AlgorithmDescriptor,
    ) -> Result<ArrayRef> {
        let rows = ListColumn::try_from_array(list)?;
        let query = QueryVector::try_from_array(query)?;
        Ok(Arc::new(self.evaluate(&rows, &query, algorithm)))
    }

    /// Reduces the list column named `column` of `batch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the inputs fail the
    /// checks of [`ReductionEngine::evaluate_arrays`].
    pub fn evaluate_column(
        &self,
        batch: &RecordBatch,
        column: &str,
        query: &dyn Array,
        algorithm: &AlgorithmDescriptor,
    ) -> Result<ArrayRef> {
        let list = batch.column_by_name(column).ok_or_else(|| {
            DistanceError::InvalidArgument(format!("Column not found: {column}"))
        })?;
        self.evaluate_arrays(list.as_ref(), query, algorithm)
    }

    fn reduce_row(
        &self,
        rows: &ListColumn,
        index: usize,
        query: ListRow<'_>,
        algorithm: &AlgorithmDescriptor,
        scratch: &mut Scratch,
    ) -> Option<f64> {
        let row = rows.row(index)?;
        let rhs = match algorithm.arity() {
            Arity::Unary => None,
            Arity::Binary => Some(query),
        };

        let len = match rhs {
            Some(rhs) if rhs.len() != row.len() => match self.config.length_policy {
                LengthPolicy::Truncate => row.len().min(rhs.len()),
                LengthPolicy::Null => {
                    trace!(
                        row = index,
                        list_len = row.len(),
                        query_len = rhs.len(),
                        "length mismatch, emitting null"
                    );
                    return None;
                }
            },
            _ => row.len(),
        };

        let reduction = algorithm.algorithm();
        let has_nulls = row.has_nulls(len) || rhs.is_some_and(|rhs| rhs.has_nulls(len));
        if !has_nulls {
            let lhs = &row.values()[..len];
            let rhs = rhs.map(|rhs| &rhs.values()[..len]);
            return Some(self.reduce(reduction, lhs, rhs));
        }

        match self.config.null_element_policy {
            NullElementPolicy::Propagate => {
                trace!(row = index, "null element, emitting null");
                None
            }
            NullElementPolicy::Skip => {
                scratch.compact(row, rhs, len);
                let rhs = rhs.map(|_| scratch.rhs.as_slice());
                Some(self.reduce(reduction, &scratch.lhs, rhs))
            }
        }
    }

    fn reduce(&self, reduction: &dyn Reduction, lhs: &[f64], rhs: Option<&[f64]>) -> f64 {
        let mut batches = SubBatches::new(lhs, rhs, self.config.sub_batch_width);
        if self.config.combine_sub_batches {
            reduction.reduce_partitioned(&mut batches)
        } else {
            reduction.reduce(&mut batches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AlgorithmRegistry;

    fn resolve(name: &str) -> AlgorithmDescriptor {
        AlgorithmRegistry::with_builtins().resolve(name).unwrap()
    }

    fn values(array: &Float64Array) -> Vec<Option<f64>> {
        array.iter().collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let engine = ReductionEngine::default();
        let rows = ListColumn::from_rows(vec![Some(vec![Some(1.0), Some(2.0), Some(3.0)])]);
        let query = QueryVector::new(vec![4.0, 5.0, 6.0]);

        let l2 = engine.evaluate(&rows, &query, &resolve("l2distance"));
        assert!((l2.value(0) - 27f64.sqrt()).abs() < 1e-12);

        let dot = engine.evaluate(&rows, &query, &resolve("dot_product"));
        assert_eq!(dot.value(0), 32.0);

        let cos = engine.evaluate(&rows, &query, &resolve("cosine_similarity"));
        assert!((cos.value(0) - 0.9746).abs() < 1e-4);
    }

    #[test]
    fn test_null_query_short_circuits() {
        let engine = ReductionEngine::default();
        let rows = ListColumn::from_rows(vec![Some(vec![Some(1.0)]), None, Some(vec![])]);
        let result = engine.evaluate(&rows, &QueryVector::null(), &resolve("l2norm"));
        assert_eq!(result.len(), 3);
        assert_eq!(result.null_count(), 3);
    }

    #[test]
    fn test_null_and_empty_rows() {
        let engine = ReductionEngine::default();
        let rows = ListColumn::from_rows(vec![None, Some(vec![])]);
        let query = QueryVector::empty();

        let norm = engine.evaluate(&rows, &query, &resolve("l2norm"));
        assert_eq!(values(&norm), vec![None, Some(0.0)]);

        let dot = engine.evaluate(&rows, &query, &resolve("dot_product"));
        assert_eq!(values(&dot), vec![None, Some(0.0)]);

        let cos = engine.evaluate(&rows, &query, &resolve("cosine_similarity"));
        assert!(cos.is_null(0));
        assert!(cos.value(1).is_nan());
    }

    #[test]
    fn test_unary_ignores_query_values() {
        let engine = ReductionEngine::default();
        let rows = ListColumn::from_rows(vec![Some(vec![Some(3.0), Some(4.0)])]);
        let query = QueryVector::new(vec![100.0]);
        let norm = engine.evaluate(&rows, &query, &resolve("l2norm"));
        assert_eq!(norm.value(0), 5.0);
    }

    #[test]
    fn test_length_mismatch_policies() {
        let rows = ListColumn::from_rows(vec![
            Some(vec![Some(1.0), Some(2.0), Some(3.0)]),
            Some(vec![Some(1.0)]),
        ]);
        let query = QueryVector::new(vec![1.0, 1.0]);
        let dot = resolve("dot_product");

        let truncate = ReductionEngine::default();
        assert_eq!(
            values(&truncate.evaluate(&rows, &query, &dot)),
            vec![Some(3.0), Some(1.0)]
        );

        let null = ReductionEngine::new(EngineConfig::new().with_length_policy(LengthPolicy::Null))
            .unwrap();
        assert_eq!(values(&null.evaluate(&rows, &query, &dot)), vec![None, None]);
    }

    #[test]
    fn test_null_element_policies() {
        let rows = ListColumn::from_rows(vec![
            Some(vec![Some(1.0), None, Some(3.0)]),
            Some(vec![Some(1.0), Some(1.0), Some(1.0)]),
        ]);
        let query = QueryVector::new(vec![2.0, 2.0, 2.0]);
        let dot = resolve("dot_product");

        let propagate = ReductionEngine::default();
        assert_eq!(
            values(&propagate.evaluate(&rows, &query, &dot)),
            vec![None, Some(6.0)]
        );

        let skip = ReductionEngine::new(
            EngineConfig::new().with_null_element_policy(NullElementPolicy::Skip),
        )
        .unwrap();
        assert_eq!(
            values(&skip.evaluate(&rows, &query, &dot)),
            vec![Some(8.0), Some(6.0)]
        );
    }

    #[test]
    fn test_null_query_element() {
        let rows = ListColumn::from_rows(vec![Some(vec![Some(1.0), Some(5.0)])]);
        let query = QueryVector::from_options(vec![Some(2.0), None]);
        let dot = resolve("dot_product");

        assert!(ReductionEngine::default().evaluate(&rows, &query, &dot).is_null(0));

        let skip = ReductionEngine::new(
            EngineConfig::new().with_null_element_policy(NullElementPolicy::Skip),
        )
        .unwrap();
        assert_eq!(skip.evaluate(&rows, &query, &dot).value(0), 2.0);
    }

    #[test]
    fn test_null_beyond_truncated_length_is_ignored() {
        let rows = ListColumn::from_rows(vec![Some(vec![Some(1.0), Some(2.0), None])]);
        let query = QueryVector::new(vec![1.0, 1.0]);
        let result = ReductionEngine::default().evaluate(&rows, &query, &resolve("dot_product"));
        assert_eq!(result.value(0), 3.0);
    }

    #[test]
    fn test_sub_batch_width_invariance() {
        let list: Vec<Option<f64>> = (0..100).map(|i| Some(f64::from(i) * 0.25 - 7.0)).collect();
        let query: Vec<f64> = (0..100).map(|i| 1.0 + f64::from(i % 7)).collect();
        let rows = ListColumn::from_rows(vec![Some(list)]);
        let query = QueryVector::new(query);

        for name in ["l2distance", "dot_product", "cosine_distance", "l2norm"] {
            let algorithm = resolve(name);
            let baseline = ReductionEngine::default().evaluate(&rows, &query, &algorithm);
            for width in [1, 3, 64] {
                for combine in [false, true] {
                    let engine = ReductionEngine::new(
                        EngineConfig::new()
                            .with_sub_batch_width(width)
                            .with_combine_sub_batches(combine),
                    )
                    .unwrap();
                    let result = engine.evaluate(&rows, &query, &algorithm);
                    assert!(
                        (result.value(0) - baseline.value(0)).abs() < 1e-9,
                        "{name} width={width} combine={combine}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rows = ListColumn::from_rows(
            (0..64).map(|i| Some((0..(i % 9)).map(|j| Some(f64::from(i * j))).collect::<Vec<_>>())),
        );
        let query = QueryVector::new(vec![0.5; 8]);
        let algorithm = resolve("l2distance");

        let sequential = ReductionEngine::default().evaluate(&rows, &query, &algorithm);
        let parallel = ReductionEngine::new(
            EngineConfig::new()
                .with_parallel(true)
                .with_parallel_row_threshold(1),
        )
        .unwrap()
        .evaluate(&rows, &query, &algorithm);
        assert_eq!(values(&sequential), values(&parallel));
    }

    #[test]
    fn test_evaluate_arrays_and_column() {
        use arrow::array::ListArray;
        use arrow::datatypes::{DataType, Field, Float64Type, Schema};

        let list = ListArray::from_iter_primitive::<Float64Type, _, _>(vec![
            Some(vec![Some(1.0), Some(2.0), Some(3.0)]),
            None,
        ]);
        let query = ListArray::from_iter_primitive::<Float64Type, _, _>(vec![Some(vec![
            Some(4.0),
            Some(5.0),
            Some(6.0),
        ])]);
        let engine = ReductionEngine::default();
        let dot = resolve("dot_product");

        let result = engine.evaluate_arrays(&list, &query, &dot).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.is_null(1));

        let schema = Arc::new(Schema::new(vec![Field::new(
            "embedding",
            list.data_type().clone(),
            true,
        )]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(list) as ArrayRef]).unwrap();
        let result = engine.evaluate_column(&batch, "embedding", &query, &dot).unwrap();
        let result = result.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(result.value(0), 32.0);
        assert_eq!(*result.data_type(), DataType::Float64);

        assert!(matches!(
            engine.evaluate_column(&batch, "missing", &query, &dot),
            Err(DistanceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ReductionEngine::new(EngineConfig::new().with_sub_batch_width(0)).is_err());
    }
}
