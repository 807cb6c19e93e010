//! Type mapper contract and the default numeric-normalizing mapper

use crate::contract::{DbValue, MappingError, RowCursor};
use bigdecimal::ToPrimitive;
use std::borrow::Cow;
use std::fmt;

/// Semantic value type a mapper is registered for.
///
/// Built-in host types use the associated constants; native enum columns use
/// their database type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    pub const BOOL: TypeKey = TypeKey::new("bool");
    pub const I32: TypeKey = TypeKey::new("i32");
    pub const I64: TypeKey = TypeKey::new("i64");
    pub const F64: TypeKey = TypeKey::new("f64");
    pub const DECIMAL: TypeKey = TypeKey::new("decimal");
    pub const TEXT: TypeKey = TypeKey::new("text");
    pub const BYTES: TypeKey = TypeKey::new("bytes");
    pub const UUID: TypeKey = TypeKey::new("uuid");
    pub const TIMESTAMP: TypeKey = TypeKey::new("timestamp");
    pub const JSON: TypeKey = TypeKey::new("json");
    pub const POINT: TypeKey = TypeKey::new("point");

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Key for a name only known at runtime (e.g. from configuration)
    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversion strategy between a database column representation and a host
/// value for one semantic type.
///
/// Implementations hold no per-call state and may be shared across threads
/// reading different row cursors.
pub trait TypeMapper: Send + Sync {
    /// Mapper name for diagnostics
    fn name(&self) -> &'static str;

    /// Read the named column of the current row as a host value
    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError>;

    /// Convert a host value into the value the statement layer binds.
    ///
    /// Errors leave the column empty; the binding layer attaches the
    /// parameter name.
    fn to_database(&self, value: DbValue) -> Result<DbValue, MappingError>;

    /// Placeholder expression substituted for a named parameter
    fn format_parameter(&self, param_name: &str) -> String {
        placeholder(param_name)
    }
}

/// Plain named bound-parameter placeholder
pub fn placeholder(param_name: &str) -> String {
    format!(":{param_name}")
}

/// Read a column through the row cursor, attaching the column name on failure
pub fn read_column(row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
    row.value(column).map_err(|source| MappingError::ColumnRead {
        column: column.to_string(),
        source,
    })
}

/// Decimal digits in `i64::MAX`
const I64_MAX_DIGITS: u64 = 19;

/// Narrow whole-number decimals to `i64`.
///
/// A decimal with zero or negative scale that fits in 64 bits becomes
/// `DbValue::I64`; anything else, including whole numbers outside the `i64`
/// range and decimals with a fractional scale, is returned unchanged. Only
/// the 64-bit width is targeted.
pub fn normalize_numeric(value: DbValue) -> DbValue {
    match value {
        DbValue::Decimal(decimal) => {
            let (_, scale) = decimal.as_bigint_and_exponent();
            if scale > 0 {
                return DbValue::Decimal(decimal);
            }
            // Rescaling expands the digits; skip values that cannot fit
            let digits = decimal.digits().saturating_add(scale.unsigned_abs());
            if digits > I64_MAX_DIGITS {
                return DbValue::Decimal(decimal);
            }
            match decimal.to_i64() {
                Some(whole) => DbValue::I64(whole),
                None => DbValue::Decimal(decimal),
            }
        }
        DbValue::Null
        | DbValue::Bool(_)
        | DbValue::I32(_)
        | DbValue::I64(_)
        | DbValue::F64(_)
        | DbValue::Text(_)
        | DbValue::Bytes(_)
        | DbValue::Uuid(_)
        | DbValue::Timestamp(_)
        | DbValue::Json(_)
        | DbValue::Point(_) => value,
    }
}

/// Fallback mapper used when no specific mapper is registered for a type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeMapper;

impl TypeMapper for DefaultTypeMapper {
    fn name(&self) -> &'static str {
        "default"
    }

    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
        read_column(row, column).map(normalize_numeric)
    }

    fn to_database(&self, value: DbValue) -> Result<DbValue, MappingError> {
        match value {
            // Geometry needs a dialect's literal syntax to be bound
            DbValue::Point(_) => Err(MappingError::UnsupportedType {
                column: String::new(),
                type_key: TypeKey::POINT.to_string(),
                value_kind: value.kind(),
            }),
            other => Ok(other),
        }
    }
}
