//! Borrowed views over Arrow list columns.
//!
//! A [`ListColumn`] keeps the flat child values of a list array, widened to
//! `f64`, next to an offsets index buffer. Row views are slices into that
//! storage, so ragged rows are never copied.

use arrow::array::{
    Array, ArrayRef, AsArray, FixedSizeListArray, Float64Array, GenericListArray, ListArray,
    OffsetSizeTrait,
};
use arrow::buffer::NullBuffer;
use arrow::compute::cast;
use arrow::datatypes::{ArrowNativeType, DataType, Float64Type};

use crate::error::{DistanceError, Result};

/// A column of variable-length numeric lists.
#[derive(Debug, Clone)]
pub struct ListColumn {
    /// Flat element storage shared by every row.
    values: Float64Array,
    /// `offsets[i]..offsets[i + 1]` is the element range of row `i`.
    offsets: Vec<usize>,
    /// Row validity.
    nulls: Option<NullBuffer>,
}

impl ListColumn {
    /// Wraps an Arrow array of lists.
    ///
    /// Accepts `List`, `LargeList` and `FixedSizeList` with any numeric child
    /// type, plus `Null`-typed arrays (every row null). Child values are cast
    /// to `Float64` once; a `Float64` child is shared without copying.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-list arrays or non-numeric children.
    pub fn try_from_array(array: &dyn Array) -> Result<Self> {
        match array.data_type() {
            DataType::List(_) => Self::from_offsets_list(array.as_list::<i32>()),
            DataType::LargeList(_) => Self::from_offsets_list(array.as_list::<i64>()),
            DataType::FixedSizeList(_, _) => Self::from_fixed_size_list(array.as_fixed_size_list()),
            DataType::Null => Ok(Self::all_null(array.len())),
            other => Err(DistanceError::type_error("LIST<numeric>", other)),
        }
    }

    /// Builds a column from rows of optional elements.
    pub fn from_rows<I, P>(rows: I) -> Self
    where
        I: IntoIterator<Item = Option<P>>,
        P: IntoIterator<Item = Option<f64>>,
    {
        let list = ListArray::from_iter_primitive::<Float64Type, P, I>(rows);
        ListColumn {
            values: list.values().as_primitive::<Float64Type>().clone(),
            offsets: list.value_offsets().iter().map(|o| o.as_usize()).collect(),
            nulls: list.nulls().cloned(),
        }
    }

    /// Creates a column of `len` null rows.
    #[must_use]
    pub fn all_null(len: usize) -> Self {
        ListColumn {
            values: Float64Array::from(Vec::<f64>::new()),
            offsets: vec![0; len + 1],
            nulls: Some(NullBuffer::new_null(len)),
        }
    }

    fn from_offsets_list<O: OffsetSizeTrait>(list: &GenericListArray<O>) -> Result<Self> {
        Ok(ListColumn {
            values: widen(list.values())?,
            offsets: list.value_offsets().iter().map(|o| o.as_usize()).collect(),
            nulls: list.nulls().cloned(),
        })
    }

    fn from_fixed_size_list(list: &FixedSizeListArray) -> Result<Self> {
        let width = usize::try_from(list.value_length()).map_err(|_| {
            DistanceError::InvalidArgument(format!(
                "Negative fixed list size {}",
                list.value_length()
            ))
        })?;
        Ok(ListColumn {
            values: widen(list.values())?,
            offsets: (0..=list.len()).map(|i| i * width).collect(),
            nulls: list.nulls().cloned(),
        })
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if row `index` is null.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.nulls.as_ref().is_some_and(|n| n.is_null(index))
    }

    /// Returns the number of null rows.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.nulls.as_ref().map_or(0, NullBuffer::null_count)
    }

    /// Returns a view of row `index`, or `None` if the row is null.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<ListRow<'_>> {
        if self.is_null(index) {
            return None;
        }
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        Some(ListRow {
            values: &self.values.values()[start..end],
            nulls: self.values.nulls(),
            offset: start,
        })
    }

    /// Returns the total number of elements across all rows.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0) - self.offsets.first().copied().unwrap_or(0)
    }
}

/// One non-null row of a list column.
#[derive(Debug, Clone, Copy)]
pub struct ListRow<'a> {
    values: &'a [f64],
    /// Validity of the whole child array; indexed from `offset`.
    nulls: Option<&'a NullBuffer>,
    offset: usize,
}

impl<'a> ListRow<'a> {
    /// Returns the elements. Slots of null elements hold unspecified values.
    #[must_use]
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if element `index` is null.
    #[must_use]
    pub fn is_element_null(&self, index: usize) -> bool {
        self.nulls.is_some_and(|n| n.is_null(self.offset + index))
    }

    /// Returns true if any of the first `len` elements is null.
    #[must_use]
    pub fn has_nulls(&self, len: usize) -> bool {
        match self.nulls {
            Some(nulls) if nulls.null_count() > 0 => {
                (self.offset..self.offset + len).any(|i| nulls.is_null(i))
            }
            _ => false,
        }
    }
}

/// The list every row is compared against.
///
/// A null query makes every output null.
#[derive(Debug, Clone)]
pub struct QueryVector {
    values: Option<Float64Array>,
}

impl QueryVector {
    /// Creates a query from dense values.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        QueryVector {
            values: Some(Float64Array::from(values)),
        }
    }

    /// Creates a query whose elements may be null.
    #[must_use]
    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        QueryVector {
            values: Some(Float64Array::from(values)),
        }
    }

    /// Creates a zero-length query, the natural argument for unary algorithms.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a null query.
    #[must_use]
    pub fn null() -> Self {
        QueryVector { values: None }
    }

    /// Extracts the query from a single-row list array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array is not a list of numbers, or if it does not
    /// hold exactly one row.
    pub fn try_from_array(array: &dyn Array) -> Result<Self> {
        let column = ListColumn::try_from_array(array)?;
        if column.len() != 1 {
            return Err(DistanceError::InvalidArgument(format!(
                "Query vector must be a single list, got {} rows",
                column.len()
            )));
        }
        if column.is_null(0) {
            return Ok(Self::null());
        }
        let start = column.offsets[0];
        let len = column.offsets[1] - start;
        Ok(QueryVector {
            values: Some(column.values.slice(start, len)),
        })
    }

    /// Returns true if the query is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.values.is_none()
    }

    /// Returns the number of elements, or `None` for a null query.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.values.as_ref().map(Array::len)
    }

    /// Returns the query as a row view, or `None` if it is null.
    #[must_use]
    pub fn as_row(&self) -> Option<ListRow<'_>> {
        self.values.as_ref().map(|values| ListRow {
            values: values.values(),
            nulls: values.nulls(),
            offset: 0,
        })
    }
}

fn widen(values: &ArrayRef) -> Result<Float64Array> {
    let data_type = values.data_type();
    if !data_type.is_numeric() && *data_type != DataType::Null {
        return Err(DistanceError::type_error("numeric list elements", data_type));
    }
    let widened = cast(values.as_ref(), &DataType::Float64)?;
    Ok(widened.as_primitive::<Float64Type>().clone())
}
