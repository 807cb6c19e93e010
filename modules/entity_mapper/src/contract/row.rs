//! Row cursor abstraction consumed from the query-execution layer

use super::model::DbValue;
use anyhow::Result;

/// One positioned result row with column-name based access.
///
/// SQL NULL is reported as `DbValue::Null`; an unknown column or a driver
/// failure is an error.
pub trait RowCursor {
    /// Read the boxed value of a column
    fn value(&self, column: &str) -> Result<DbValue>;

    /// Check whether a column holds SQL NULL
    fn is_null(&self, column: &str) -> Result<bool> {
        Ok(self.value(column)?.is_null())
    }
}

impl<R: RowCursor + ?Sized> RowCursor for &R {
    fn value(&self, column: &str) -> Result<DbValue> {
        (**self).value(column)
    }
}
