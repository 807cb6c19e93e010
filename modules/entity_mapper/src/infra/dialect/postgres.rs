//! PostgreSQL / PostGIS mappers

use super::wkt;
use crate::contract::{DbValue, MappingError, RowCursor};
use crate::domain::mapper::{placeholder, read_column, TypeKey, TypeMapper};

/// PostGIS `geometry(Point)` columns.
///
/// Reads native points, WKT (`ST_AsText`) or EWKT (`ST_AsEWKT`) text; binds
/// WKT through `ST_GeomFromText` with the configured SRID. EWKT tagged with a
/// different SRID is rejected.
#[derive(Debug, Clone, Copy)]
pub struct PostgisPointMapper {
    srid: u32,
}

impl PostgisPointMapper {
    pub fn new(srid: u32) -> Self {
        Self { srid }
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }
}

impl TypeMapper for PostgisPointMapper {
    fn name(&self) -> &'static str {
        "postgis-point"
    }

    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
        match read_column(row, column)? {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Point(point) => Ok(DbValue::Point(point)),
            DbValue::Text(text) => wkt::split_srid(&text)
                .and_then(|(srid, literal)| match srid {
                    Some(srid) if srid != self.srid => Err(format!(
                        "SRID {srid} does not match the configured SRID {}",
                        self.srid
                    )),
                    _ => wkt::parse_point(literal),
                })
                .map(DbValue::Point)
                .map_err(|reason| MappingError::malformed(column, wkt::GRAMMAR, text, reason)),
            other => Err(MappingError::UnsupportedType {
                column: column.to_string(),
                type_key: TypeKey::POINT.to_string(),
                value_kind: other.kind(),
            }),
        }
    }

    fn to_database(&self, value: DbValue) -> Result<DbValue, MappingError> {
        match value {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Point(point) => wkt::literal(point),
            other => Err(MappingError::UnsupportedType {
                column: String::new(),
                type_key: TypeKey::POINT.to_string(),
                value_kind: other.kind(),
            }),
        }
    }

    fn format_parameter(&self, param_name: &str) -> String {
        format!("ST_GeomFromText({}, {})", placeholder(param_name), self.srid)
    }
}

/// Native `CREATE TYPE ... AS ENUM` columns.
///
/// Labels travel as text and are cast to the enum type server-side.
#[derive(Debug, Clone)]
pub struct PostgresEnumMapper {
    type_name: String,
    labels: Vec<String>,
}

impl PostgresEnumMapper {
    pub fn new(type_name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            labels,
        }
    }

    fn check_label(&self, column: &str, label: String) -> Result<DbValue, MappingError> {
        if self.labels.contains(&label) {
            Ok(DbValue::Text(label))
        } else {
            Err(MappingError::conversion(
                column,
                "native enum",
                format!("'{label}' is not a label of {}", self.type_name),
            ))
        }
    }
}

impl TypeMapper for PostgresEnumMapper {
    fn name(&self) -> &'static str {
        "postgres-enum"
    }

    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
        match read_column(row, column)? {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Text(label) => self.check_label(column, label),
            other => Err(MappingError::UnsupportedType {
                column: column.to_string(),
                type_key: self.type_name.clone(),
                value_kind: other.kind(),
            }),
        }
    }

    fn to_database(&self, value: DbValue) -> Result<DbValue, MappingError> {
        match value {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Text(label) => self.check_label("", label),
            other => Err(MappingError::UnsupportedType {
                column: String::new(),
                type_key: self.type_name.clone(),
                value_kind: other.kind(),
            }),
        }
    }

    fn format_parameter(&self, param_name: &str) -> String {
        format!(
            "CAST({} AS {})",
            placeholder(param_name),
            quote_ident(&self.type_name)
        )
    }
}

/// Double-quote an identifier, doubling embedded quotes
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
