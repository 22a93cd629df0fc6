//! Sub-batch chunking and per-call scratch buffers.

use crate::algorithm::SubBatch;

use super::column::ListRow;

/// Splits a row's paired elements into sub-batches of at most `width` pairs.
///
/// The k-th sub-batch pairs `lhs[k*w..(k+1)*w]` with the same range of `rhs`.
#[derive(Debug)]
pub(crate) struct SubBatches<'a> {
    lhs: &'a [f64],
    rhs: Option<&'a [f64]>,
    width: usize,
}

impl<'a> SubBatches<'a> {
    pub(crate) fn new(lhs: &'a [f64], rhs: Option<&'a [f64]>, width: usize) -> Self {
        debug_assert!(width > 0);
        debug_assert!(rhs.map_or(true, |r| r.len() == lhs.len()));
        SubBatches { lhs, rhs, width }
    }
}

impl<'a> Iterator for SubBatches<'a> {
    type Item = SubBatch<'a>;

    fn next(&mut self) -> Option<SubBatch<'a>> {
        if self.lhs.is_empty() {
            return None;
        }
        let take = self.width.min(self.lhs.len());
        let (lhs, lhs_rest) = self.lhs.split_at(take);
        self.lhs = lhs_rest;
        let rhs = match self.rhs {
            Some(rhs) => {
                let (head, rest) = rhs.split_at(take);
                self.rhs = Some(rest);
                Some(head)
            }
            None => None,
        };
        Some(SubBatch { lhs, rhs })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.lhs.len().div_ceil(self.width);
        (n, Some(n))
    }
}

/// Buffers for rows whose null elements have to be dropped before reduction.
///
/// Owned by a single evaluate call (or one worker of it) and reused across
/// rows; only element values pass through here, never accumulator state.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub(crate) lhs: Vec<f64>,
    pub(crate) rhs: Vec<f64>,
}

impl Scratch {
    /// Copies the first `len` pairs of `row` and `query` that contain no null.
    pub(crate) fn compact(&mut self, row: ListRow<'_>, query: Option<ListRow<'_>>, len: usize) {
        self.lhs.clear();
        self.rhs.clear();
        let lhs = &row.values()[..len];
        match query {
            Some(query) => {
                let rhs = &query.values()[..len];
                for (j, (&x, &y)) in lhs.iter().zip(rhs).enumerate() {
                    if !row.is_element_null(j) && !query.is_element_null(j) {
                        self.lhs.push(x);
                        self.rhs.push(y);
                    }
                }
            }
            None => {
                for (j, &x) in lhs.iter().enumerate() {
                    if !row.is_element_null(j) {
                        self.lhs.push(x);
                    }
                }
            }
        }
    }
}
