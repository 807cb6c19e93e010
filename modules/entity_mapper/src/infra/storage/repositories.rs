//! Foreign-key repository implementations

use super::json_row::JsonRow;
use crate::contract::{DbValue, RowCursor};
use crate::domain::repository::ForeignKeyRepository;
use crate::domain::row_mapper::{EntityMapper, FromRow};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use sea_orm::sea_query::{Alias, Expr, Order, SimpleExpr};
use sea_orm::{DatabaseConnection, EntityName, EntityTrait, QueryFilter, QueryOrder};
use std::marker::PhantomData;
use std::sync::Arc;

// ===== SeaORM Repository =====

/// Looks children up in the table of SeaORM entity `E` and maps each row
/// into `C` through the entity mapper.
pub struct SeaOrmForeignKeyRepository<E, C> {
    db: Arc<DatabaseConnection>,
    mapper: EntityMapper,
    table: String,
    order_by: Option<&'static str>,
    _marker: PhantomData<fn() -> (E, C)>,
}

impl<E: EntityTrait, C> SeaOrmForeignKeyRepository<E, C> {
    pub fn new(db: Arc<DatabaseConnection>, mapper: EntityMapper) -> Self {
        Self {
            db,
            mapper,
            table: E::default().table_name().to_string(),
            order_by: None,
            _marker: PhantomData,
        }
    }

    /// Return rows sorted by `column` instead of table order
    #[must_use]
    pub fn ordered_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }
}

#[async_trait]
impl<E, C> ForeignKeyRepository<C> for SeaOrmForeignKeyRepository<E, C>
where
    E: EntityTrait,
    C: FromRow + Send + 'static,
{
    fn name(&self) -> &str {
        &self.table
    }

    async fn find_by_foreign_key(&self, field_name: &str, value: &DbValue) -> Result<Vec<C>> {
        let value = sea_orm::Value::try_from(value.clone())?;
        let mut query = E::find().filter(Expr::col(Alias::new(field_name)).eq(value));
        if let Some(column) = self.order_by {
            query = query.order_by(SimpleExpr::from(Expr::col(Alias::new(column))), Order::Asc);
        }

        let rows = query.into_json().all(&*self.db).await?;
        tracing::trace!(table = %self.table, field_name, rows = rows.len(), "foreign key lookup");

        let rows = rows
            .into_iter()
            .map(JsonRow::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(self.mapper.map_rows(rows)?)
    }
}

// ===== In-Memory Repository =====

/// Holds raw rows in memory and maps matching rows into `C` on every lookup
pub struct InMemoryRowRepository<C> {
    name: String,
    mapper: EntityMapper,
    rows: RwLock<Vec<JsonRow>>,
    _marker: PhantomData<fn() -> C>,
}

impl<C> InMemoryRowRepository<C> {
    pub fn new(name: impl Into<String>, mapper: EntityMapper) -> Self {
        Self {
            name: name.into(),
            mapper,
            rows: RwLock::new(Vec::new()),
            _marker: PhantomData,
        }
    }

    /// Seed with JSON object rows
    pub fn with_rows(self, rows: impl IntoIterator<Item = serde_json::Value>) -> Result<Self> {
        for row in rows {
            self.insert(JsonRow::try_from(row)?);
        }
        Ok(self)
    }

    pub fn insert(&self, row: JsonRow) {
        self.rows.write().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl<C> ForeignKeyRepository<C> for InMemoryRowRepository<C>
where
    C: FromRow + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_by_foreign_key(&self, field_name: &str, value: &DbValue) -> Result<Vec<C>> {
        let matching = {
            let rows = self.rows.read();
            let mut matching = Vec::new();
            for row in rows.iter() {
                if keys_equal(&row.value(field_name)?, value) {
                    matching.push(row.clone());
                }
            }
            matching
        };
        Ok(self.mapper.map_rows(matching)?)
    }
}

/// Key equality across integer widths
fn keys_equal(a: &DbValue, b: &DbValue) -> bool {
    match (a, b) {
        (DbValue::I32(x), DbValue::I64(y)) | (DbValue::I64(y), DbValue::I32(x)) => {
            i64::from(*x) == *y
        }
        (DbValue::Null, _) | (_, DbValue::Null) => false,
        _ => a == b,
    }
}
