//! Row cursor over a JSON object
//!
//! This is the row shape SeaORM's `into_json()` selects produce, and a
//! convenient one for fixtures.

use crate::contract::{DbValue, RowCursor};
use anyhow::{anyhow, bail, Result};
use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

/// One result row keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRow(Map<String, Value>);

impl JsonRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON value of a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for JsonRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for JsonRow {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => bail!("expected a JSON object row, got {}", json_kind(&other)),
        }
    }
}

impl RowCursor for JsonRow {
    fn value(&self, column: &str) -> Result<DbValue> {
        self.0
            .get(column)
            .map(to_db_value)
            .ok_or_else(|| anyhow!("row has no column '{column}'"))
    }
}

/// Box a JSON value the way a driver would report it
fn to_db_value(value: &Value) -> DbValue {
    match value {
        Value::Null => DbValue::Null,
        Value::Bool(b) => DbValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DbValue::I64(i)
            } else if let Some(u) = n.as_u64() {
                // Beyond i64: keep it exact
                DbValue::Decimal(BigDecimal::from(u))
            } else {
                n.as_f64().map_or(DbValue::Null, DbValue::F64)
            }
        }
        Value::String(s) => DbValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => DbValue::Json(value.clone()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
