//! Repository traits for relationship data access
//!
//! The resolver only needs one query shape: all rows of a type whose field
//! equals a value. Implementations are in infra/storage/repositories.rs

use crate::contract::DbValue;
use anyhow::Result;
use async_trait::async_trait;

/// Repository able to look up entities of type `C` by a foreign-key field
#[async_trait]
pub trait ForeignKeyRepository<C>: Send + Sync {
    /// Repository name for diagnostics and relationship introspection
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Find all entities whose `field_name` equals `value`, in repository
    /// order
    async fn find_by_foreign_key(&self, field_name: &str, value: &DbValue) -> Result<Vec<C>>;
}
