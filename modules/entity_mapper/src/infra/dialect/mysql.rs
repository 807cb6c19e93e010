//! MySQL / MariaDB mappers

use super::wkt;
use crate::contract::{DbValue, MappingError, RowCursor};
use crate::domain::mapper::{placeholder, read_column, TypeKey, TypeMapper};

/// Spatial `POINT` columns.
///
/// Reads native points or WKT text (`ST_AsText`); binds WKT through
/// `ST_GeomFromText`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlPointMapper;

impl TypeMapper for MysqlPointMapper {
    fn name(&self) -> &'static str {
        "mysql-point"
    }

    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
        match read_column(row, column)? {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Point(point) => Ok(DbValue::Point(point)),
            DbValue::Text(text) => wkt::parse_point(&text)
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
        format!("ST_GeomFromText({})", placeholder(param_name))
    }
}

/// Native `ENUM(...)` columns.
///
/// MySQL reports the label as text, or its 1-based ordinal when the column is
/// used in numeric context. Labels are bound as plain text.
#[derive(Debug, Clone)]
pub struct MysqlEnumMapper {
    type_name: String,
    labels: Vec<String>,
}

impl MysqlEnumMapper {
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

    fn label_at(&self, column: &str, ordinal: i64) -> Result<DbValue, MappingError> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.labels.get(index))
            .map(|label| DbValue::Text(label.clone()))
            .ok_or_else(|| {
                MappingError::conversion(
                    column,
                    "native enum",
                    format!("ordinal {ordinal} is outside {}", self.type_name),
                )
            })
    }
}

impl TypeMapper for MysqlEnumMapper {
    fn name(&self) -> &'static str {
        "mysql-enum"
    }

    fn map(&self, row: &dyn RowCursor, column: &str) -> Result<DbValue, MappingError> {
        match read_column(row, column)? {
            DbValue::Null => Ok(DbValue::Null),
            DbValue::Text(label) => self.check_label(column, label),
            DbValue::I32(ordinal) => self.label_at(column, i64::from(ordinal)),
            DbValue::I64(ordinal) => self.label_at(column, ordinal),
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
}
