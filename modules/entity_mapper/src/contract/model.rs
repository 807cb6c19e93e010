//! Contract models for the entity mapper
//!
//! Boxed database values and the dialect tag. These are the only shapes that
//! cross the boundary between the engine and the query-execution layer.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Boxed database value as delivered by a row cursor or handed to the
/// statement layer for binding.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// Double precision float
    F64(f64),
    /// Arbitrary-precision decimal (NUMERIC / DECIMAL)
    Decimal(BigDecimal),
    /// Text data
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// UUID value
    Uuid(Uuid),
    /// Timestamp in UTC
    Timestamp(DateTime<Utc>),
    /// JSON document
    Json(serde_json::Value),
    /// Native point geometry
    Point(Point),
}

impl DbValue {
    /// Check if this value is SQL NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    /// Runtime shape of the value, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DbValue::Null => "null",
            DbValue::Bool(_) => "bool",
            DbValue::I32(_) => "i32",
            DbValue::I64(_) => "i64",
            DbValue::F64(_) => "f64",
            DbValue::Decimal(_) => "decimal",
            DbValue::Text(_) => "text",
            DbValue::Bytes(_) => "bytes",
            DbValue::Uuid(_) => "uuid",
            DbValue::Timestamp(_) => "timestamp",
            DbValue::Json(_) => "json",
            DbValue::Point(_) => "point",
        }
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        DbValue::I64(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        DbValue::I32(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        DbValue::Text(v.to_string())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        DbValue::Text(v)
    }
}

impl From<Uuid> for DbValue {
    fn from(v: Uuid) -> Self {
        DbValue::Uuid(v)
    }
}

impl From<BigDecimal> for DbValue {
    fn from(v: BigDecimal) -> Self {
        DbValue::Decimal(v)
    }
}

impl From<Point> for DbValue {
    fn from(v: Point) -> Self {
        DbValue::Point(v)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DbValue::Null, Into::into)
    }
}

/// Two-dimensional point geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite; only such points have a WKT form
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Well-known-text form, e.g. `POINT(1.5 -2)`
    #[must_use]
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display is the shortest string that parses back to the same value
        write!(f, "POINT({} {})", self.x, self.y)
    }
}

/// Database product whose literal syntax or value representation differs
/// from the generic default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "mariadb")]
    Mysql,
    #[serde(alias = "postgis", alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Dialect identifier
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
