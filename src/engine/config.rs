//! Engine configuration.

use crate::error::{DistanceError, Result};

/// Default number of elements per sub-batch (the host's vector size).
pub const DEFAULT_SUB_BATCH_WIDTH: usize = 2048;

/// Default minimum row count before rows are spread across worker threads.
pub const DEFAULT_PARALLEL_ROW_THRESHOLD: usize = 4096;

/// What to do when a row list and the query vector differ in length.
///
/// Only binary algorithms pair elements, so unary algorithms ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Pair elements up to the shorter of the two lengths.
    #[default]
    Truncate,
    /// Emit null for the row.
    Null,
}

/// What to do with null elements inside a non-null row or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullElementPolicy {
    /// Any null among the paired elements makes the row's output null.
    #[default]
    Propagate,
    /// Drop pairs containing a null and reduce the rest.
    Skip,
}

/// Configuration for the reduction engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of elements handed to an algorithm per update.
    pub sub_batch_width: usize,
    /// Row/query length mismatch handling.
    pub length_policy: LengthPolicy,
    /// Null element handling.
    pub null_element_policy: NullElementPolicy,
    /// Accumulate each sub-batch into its own partial state and merge them.
    pub combine_sub_batches: bool,
    /// Allow processing rows on the rayon thread pool.
    pub parallel: bool,
    /// Minimum rows in a batch before parallel processing kicks in.
    pub parallel_row_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sub_batch_width: DEFAULT_SUB_BATCH_WIDTH,
            length_policy: LengthPolicy::default(),
            null_element_policy: NullElementPolicy::default(),
            combine_sub_batches: false,
            parallel: false,
            parallel_row_threshold: DEFAULT_PARALLEL_ROW_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Creates a new engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sub-batch width.
    #[must_use]
    pub fn with_sub_batch_width(mut self, sub_batch_width: usize) -> Self {
        self.sub_batch_width = sub_batch_width;
        self
    }

    /// Sets the length mismatch policy.
    #[must_use]
    pub fn with_length_policy(mut self, length_policy: LengthPolicy) -> Self {
        self.length_policy = length_policy;
        self
    }

    /// Sets the null element policy.
    #[must_use]
    pub fn with_null_element_policy(mut self, null_element_policy: NullElementPolicy) -> Self {
        self.null_element_policy = null_element_policy;
        self
    }

    /// Enables or disables per-sub-batch partial states.
    #[must_use]
    pub fn with_combine_sub_batches(mut self, combine_sub_batches: bool) -> Self {
        self.combine_sub_batches = combine_sub_batches;
        self
    }

    /// Enables or disables parallel row processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the parallel row threshold.
    #[must_use]
    pub fn with_parallel_row_threshold(mut self, parallel_row_threshold: usize) -> Self {
        self.parallel_row_threshold = parallel_row_threshold;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-batch width is zero.
    pub fn validate(&self) -> Result<()> {
        if self.sub_batch_width == 0 {
            return Err(DistanceError::InvalidConfig(
                "sub_batch_width must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
