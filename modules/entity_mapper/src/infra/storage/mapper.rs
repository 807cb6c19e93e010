//! Boxed value to SeaORM value conversions
//!
//! Used when a converted parameter is handed to SeaORM for binding.

use crate::contract::{DbValue, MappingError};
use crate::domain::TypeKey;
use sea_orm::Value;

impl TryFrom<DbValue> for Value {
    type Error = MappingError;

    fn try_from(value: DbValue) -> Result<Self, Self::Error> {
        Ok(match value {
            DbValue::Null => Value::String(None),
            DbValue::Bool(v) => v.into(),
            DbValue::I32(v) => v.into(),
            DbValue::I64(v) => v.into(),
            DbValue::F64(v) => v.into(),
            DbValue::Decimal(v) => v.into(),
            DbValue::Text(v) => v.into(),
            DbValue::Bytes(v) => v.into(),
            DbValue::Uuid(v) => v.into(),
            DbValue::Timestamp(v) => v.into(),
            DbValue::Json(v) => v.into(),
            // Bind the dialect mapper's WKT text instead
            DbValue::Point(_) => {
                return Err(MappingError::UnsupportedType {
                    column: String::new(),
                    type_key: TypeKey::POINT.to_string(),
                    value_kind: value.kind(),
                })
            }
        })
    }
}
