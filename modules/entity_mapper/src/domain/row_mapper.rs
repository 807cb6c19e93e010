//! Row-to-entity mapping
//!
//! [`EntityMapper`] applies the mapper resolved for each column's declared
//! type, then converts the boxed value into the field's host type through
//! [`MappedType`]. Conversions are exact or fail; nothing is truncated.

use super::mapper::{normalize_numeric, TypeKey};
use super::parameters::{BoundParameter, ParameterSet, ToParameters};
use super::registry::{SharedTypeMapperRegistry, TypeMapperRegistry};
use crate::contract::{DbValue, Dialect, MappingError, Point, RowCursor};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Largest integer magnitude an f64 holds exactly
const F64_EXACT_INT: i64 = 1 << 53;

/// Host type a column can be mapped into
pub trait MappedType: Sized {
    /// Semantic type used for mapper resolution
    const TYPE_KEY: TypeKey;

    /// Host type name for diagnostics
    const TYPE_NAME: &'static str;

    /// Convert a mapped value; `column` is only used for diagnostics
    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError>;

    /// Box the host value for binding
    fn to_db_value(&self) -> DbValue;
}

/// Entity constructed from one result row
pub trait FromRow: Sized {
    fn from_row(row: &MappedRow<'_>) -> Result<Self, MappingError>;
}

/// A row cursor paired with the mapper table used to read it
pub struct MappedRow<'a> {
    row: &'a dyn RowCursor,
    registry: &'a TypeMapperRegistry,
    dialect: Option<Dialect>,
}

impl<'a> MappedRow<'a> {
    pub fn new(
        row: &'a dyn RowCursor,
        registry: &'a TypeMapperRegistry,
        dialect: Option<Dialect>,
    ) -> Self {
        Self {
            row,
            registry,
            dialect,
        }
    }

    /// Read a column as `T` using the mapper registered for `T`
    pub fn get<T: MappedType>(&self, column: &str) -> Result<T, MappingError> {
        self.get_as(&T::TYPE_KEY, column)
    }

    /// Read a column as `T` using the mapper registered for `key`.
    ///
    /// Used for columns whose database type differs from the host type's
    /// default key, such as native enums read into `String`.
    pub fn get_as<T: MappedType>(&self, key: &TypeKey, column: &str) -> Result<T, MappingError> {
        let mapper = self.registry.resolver_for(key, self.dialect);
        let value = mapper.map(self.row, column)?;
        T::from_db_value(value, column)
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }
}

/// Maps rows into entities and entities into statement parameters for one
/// dialect.
#[derive(Clone)]
pub struct EntityMapper {
    registry: SharedTypeMapperRegistry,
    dialect: Option<Dialect>,
}

impl EntityMapper {
    pub fn new(registry: impl Into<SharedTypeMapperRegistry>, dialect: Option<Dialect>) -> Self {
        Self {
            registry: registry.into(),
            dialect,
        }
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn registry(&self) -> &SharedTypeMapperRegistry {
        &self.registry
    }

    /// Same registry, different dialect
    #[must_use]
    pub fn for_dialect(&self, dialect: Option<Dialect>) -> Self {
        Self {
            registry: self.registry.clone(),
            dialect,
        }
    }

    /// Build an entity from the current row
    pub fn map_row<T: FromRow>(&self, row: &dyn RowCursor) -> Result<T, MappingError> {
        let registry = self.registry.snapshot();
        T::from_row(&MappedRow::new(row, &registry, self.dialect))
    }

    /// Build entities from a sequence of rows, preserving order
    pub fn map_rows<T, R>(&self, rows: impl IntoIterator<Item = R>) -> Result<Vec<T>, MappingError>
    where
        T: FromRow,
        R: RowCursor,
    {
        let registry = self.registry.snapshot();
        rows.into_iter()
            .map(|row| T::from_row(&MappedRow::new(&row, &registry, self.dialect)))
            .collect()
    }

    /// Read one column of the current row as `T`
    pub fn column<T: MappedType>(&self, row: &dyn RowCursor, column: &str) -> Result<T, MappingError> {
        let registry = self.registry.snapshot();
        MappedRow::new(row, &registry, self.dialect).get(column)
    }

    /// Convert an entity's fields into bound statement parameters
    pub fn parameters<T: ToParameters>(&self, entity: &T) -> Result<Vec<BoundParameter>, MappingError> {
        let registry: Arc<TypeMapperRegistry> = self.registry.snapshot();
        let mut params = ParameterSet::new(&registry, self.dialect);
        entity.to_parameters(&mut params)?;
        Ok(params.into_parameters())
    }
}

fn mismatch(column: &str, target: &'static str, value: &DbValue) -> MappingError {
    MappingError::conversion(column, target, format!("unexpected {} value", value.kind()))
}

fn unexpected_null(column: &str, target: &'static str) -> MappingError {
    MappingError::conversion(column, target, "unexpected NULL")
}

/// NUMERIC columns reported as text, e.g. JSON-encoded rows
fn parse_decimal(column: &str, target: &'static str, text: &str) -> Result<BigDecimal, MappingError> {
    BigDecimal::from_str(text.trim())
        .map_err(|e| MappingError::conversion(column, target, format!("'{text}' is not a decimal: {e}")))
}

impl<T: MappedType> MappedType for Option<T> {
    const TYPE_KEY: TypeKey = T::TYPE_KEY;
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Null => Ok(None),
            other => T::from_db_value(other, column).map(Some),
        }
    }

    fn to_db_value(&self) -> DbValue {
        self.as_ref().map_or(DbValue::Null, MappedType::to_db_value)
    }
}

impl MappedType for bool {
    const TYPE_KEY: TypeKey = TypeKey::BOOL;
    const TYPE_NAME: &'static str = "bool";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Bool(v) => Ok(v),
            // TINYINT(1) style booleans
            DbValue::I32(0) | DbValue::I64(0) => Ok(false),
            DbValue::I32(1) | DbValue::I64(1) => Ok(true),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Bool(*self)
    }
}

impl MappedType for i32 {
    const TYPE_KEY: TypeKey = TypeKey::I32;
    const TYPE_NAME: &'static str = "i32";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::I32(v) => Ok(v),
            DbValue::I64(v) => i32::try_from(v).map_err(|_| {
                MappingError::conversion(column, Self::TYPE_NAME, format!("{v} is out of range"))
            }),
            DbValue::Text(_) => {
                let v = i64::from_db_value(value, column)?;
                i32::try_from(v).map_err(|_| {
                    MappingError::conversion(column, Self::TYPE_NAME, format!("{v} is out of range"))
                })
            }
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::I32(*self)
    }
}

impl MappedType for i64 {
    const TYPE_KEY: TypeKey = TypeKey::I64;
    const TYPE_NAME: &'static str = "i64";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::I64(v) => Ok(v),
            DbValue::I32(v) => Ok(i64::from(v)),
            // Whole decimals in range were narrowed by the default mapper
            DbValue::Decimal(d) => Err(MappingError::conversion(
                column,
                Self::TYPE_NAME,
                format!("decimal {d} does not fit exactly"),
            )),
            // Same narrowing rule as boxed decimals
            DbValue::Text(text) => {
                let decimal = parse_decimal(column, Self::TYPE_NAME, &text)?;
                match normalize_numeric(DbValue::Decimal(decimal)) {
                    DbValue::I64(v) => Ok(v),
                    _ => Err(MappingError::conversion(
                        column,
                        Self::TYPE_NAME,
                        format!("decimal {text} does not fit exactly"),
                    )),
                }
            }
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::I64(*self)
    }
}

impl MappedType for f64 {
    const TYPE_KEY: TypeKey = TypeKey::F64;
    const TYPE_NAME: &'static str = "f64";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::F64(v) => Ok(v),
            DbValue::I32(v) => Ok(f64::from(v)),
            DbValue::I64(v) if (-F64_EXACT_INT..=F64_EXACT_INT).contains(&v) => Ok(v as f64),
            DbValue::I64(v) => Err(MappingError::conversion(
                column,
                Self::TYPE_NAME,
                format!("{v} cannot be represented exactly"),
            )),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::F64(*self)
    }
}

impl MappedType for BigDecimal {
    const TYPE_KEY: TypeKey = TypeKey::DECIMAL;
    const TYPE_NAME: &'static str = "decimal";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Decimal(v) => Ok(v),
            DbValue::I64(v) => Ok(BigDecimal::from(v)),
            DbValue::I32(v) => Ok(BigDecimal::from(v)),
            DbValue::Text(text) => parse_decimal(column, Self::TYPE_NAME, &text),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Decimal(self.clone())
    }
}

impl MappedType for String {
    const TYPE_KEY: TypeKey = TypeKey::TEXT;
    const TYPE_NAME: &'static str = "text";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Text(v) => Ok(v),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Text(self.clone())
    }
}

impl MappedType for Vec<u8> {
    const TYPE_KEY: TypeKey = TypeKey::BYTES;
    const TYPE_NAME: &'static str = "bytes";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Bytes(v) => Ok(v),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Bytes(self.clone())
    }
}

impl MappedType for Uuid {
    const TYPE_KEY: TypeKey = TypeKey::UUID;
    const TYPE_NAME: &'static str = "uuid";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Uuid(v) => Ok(v),
            DbValue::Text(text) => Uuid::parse_str(&text)
                .map_err(|e| MappingError::conversion(column, Self::TYPE_NAME, e.to_string())),
            DbValue::Bytes(bytes) => Uuid::from_slice(&bytes)
                .map_err(|e| MappingError::conversion(column, Self::TYPE_NAME, e.to_string())),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Uuid(*self)
    }
}

impl MappedType for DateTime<Utc> {
    const TYPE_KEY: TypeKey = TypeKey::TIMESTAMP;
    const TYPE_NAME: &'static str = "timestamp";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Timestamp(v) => Ok(v),
            DbValue::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| MappingError::conversion(column, Self::TYPE_NAME, e.to_string())),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Timestamp(*self)
    }
}

impl MappedType for serde_json::Value {
    const TYPE_KEY: TypeKey = TypeKey::JSON;
    const TYPE_NAME: &'static str = "json";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Json(v) => Ok(v),
            DbValue::Text(text) => serde_json::from_str(&text)
                .map_err(|e| MappingError::conversion(column, Self::TYPE_NAME, e.to_string())),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Json(self.clone())
    }
}

impl MappedType for Point {
    const TYPE_KEY: TypeKey = TypeKey::POINT;
    const TYPE_NAME: &'static str = "point";

    fn from_db_value(value: DbValue, column: &str) -> Result<Self, MappingError> {
        match value {
            DbValue::Point(v) => Ok(v),
            DbValue::Null => Err(unexpected_null(column, Self::TYPE_NAME)),
            other => Err(mismatch(column, Self::TYPE_NAME, &other)),
        }
    }

    fn to_db_value(&self) -> DbValue {
        DbValue::Point(*self)
    }
}
