//! Type mapper registration table
//!
//! The table is built once at startup and read concurrently afterwards.
//! [`SharedTypeMapperRegistry`] supports replacing it at runtime: writers build
//! a new table from a copy of the current one and swap it in whole, so
//! readers always see either the old or the new table.

use super::mapper::{DefaultTypeMapper, TypeKey, TypeMapper};
use crate::config::Config;
use crate::contract::{Dialect, MappingError};
use crate::infra::dialect::{
    MysqlEnumMapper, MysqlPointMapper, PostgisPointMapper, PostgresEnumMapper,
};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type RegistryKey = (TypeKey, Option<Dialect>);

/// Immutable mapping from `(type, dialect)` to exactly one mapper
#[derive(Clone)]
pub struct TypeMapperRegistry {
    mappers: HashMap<RegistryKey, Arc<dyn TypeMapper>>,
    fallback: Arc<dyn TypeMapper>,
}

impl TypeMapperRegistry {
    pub fn builder() -> TypeMapperRegistryBuilder {
        TypeMapperRegistryBuilder::default()
    }

    /// Registry holding only the default mapper
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Registry with the built-in dialect mappers.
    ///
    /// Spatial points are registered for MySQL and PostGIS; every configured
    /// native enum is registered for MySQL and PostgreSQL.
    pub fn with_builtins(config: &Config) -> Result<Self, MappingError> {
        let mut builder = Self::builder()
            .register(TypeKey::POINT, Some(Dialect::Mysql), MysqlPointMapper)?
            .register(
                TypeKey::POINT,
                Some(Dialect::Postgres),
                PostgisPointMapper::new(config.spatial_srid),
            )?;

        for native in &config.native_enums {
            let key = TypeKey::named(native.type_name.clone());
            builder = builder
                .register(
                    key.clone(),
                    Some(Dialect::Mysql),
                    MysqlEnumMapper::new(native.type_name.clone(), native.labels.clone()),
                )?
                .register(
                    key,
                    Some(Dialect::Postgres),
                    PostgresEnumMapper::new(native.type_name.clone(), native.labels.clone()),
                )?;
        }

        Ok(builder.build())
    }

    /// Resolve the mapper for a type.
    ///
    /// Lookup order: `(type, dialect)`, then `(type, generic)`, then the
    /// default mapper.
    pub fn resolver_for(&self, key: &TypeKey, dialect: Option<Dialect>) -> Arc<dyn TypeMapper> {
        if let Some(dialect) = dialect {
            if let Some(mapper) = self.mappers.get(&(key.clone(), Some(dialect))) {
                return mapper.clone();
            }
        }
        if let Some(mapper) = self.mappers.get(&(key.clone(), None)) {
            return mapper.clone();
        }
        tracing::trace!(type_key = %key, ?dialect, "no mapper registered, using default");
        self.fallback.clone()
    }

    /// Check whether a specific mapper is registered for exactly this pair
    pub fn contains(&self, key: &TypeKey, dialect: Option<Dialect>) -> bool {
        self.mappers.contains_key(&(key.clone(), dialect))
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Builder seeded with this registry's registrations
    pub fn to_builder(&self) -> TypeMapperRegistryBuilder {
        TypeMapperRegistryBuilder {
            mappers: self.mappers.clone(),
            fallback: Some(self.fallback.clone()),
        }
    }
}

impl Default for TypeMapperRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for [`TypeMapperRegistry`]
#[derive(Default)]
pub struct TypeMapperRegistryBuilder {
    mappers: HashMap<RegistryKey, Arc<dyn TypeMapper>>,
    fallback: Option<Arc<dyn TypeMapper>>,
}

impl TypeMapperRegistryBuilder {
    /// Register a mapper; a second registration for the same pair fails
    pub fn register(
        self,
        key: TypeKey,
        dialect: Option<Dialect>,
        mapper: impl TypeMapper + 'static,
    ) -> Result<Self, MappingError> {
        self.register_arc(key, dialect, Arc::new(mapper))
    }

    pub fn register_arc(
        mut self,
        key: TypeKey,
        dialect: Option<Dialect>,
        mapper: Arc<dyn TypeMapper>,
    ) -> Result<Self, MappingError> {
        let slot = (key, dialect);
        if self.mappers.contains_key(&slot) {
            return Err(MappingError::DuplicateRegistration {
                type_key: slot.0.to_string(),
                dialect: slot.1.map_or("generic", Dialect::name).to_string(),
            });
        }
        tracing::debug!(
            type_key = %slot.0,
            dialect = slot.1.map_or("generic", Dialect::name),
            mapper = mapper.name(),
            "registering type mapper"
        );
        self.mappers.insert(slot, mapper);
        Ok(self)
    }

    /// Replace an existing registration (or add it if absent)
    #[must_use]
    pub fn replace(
        mut self,
        key: TypeKey,
        dialect: Option<Dialect>,
        mapper: impl TypeMapper + 'static,
    ) -> Self {
        self.mappers.insert((key, dialect), Arc::new(mapper));
        self
    }

    /// Remove a registration
    #[must_use]
    pub fn unregister(mut self, key: &TypeKey, dialect: Option<Dialect>) -> Self {
        self.mappers.remove(&(key.clone(), dialect));
        self
    }

    /// Override the designated default mapper
    #[must_use]
    pub fn fallback(mut self, mapper: impl TypeMapper + 'static) -> Self {
        self.fallback = Some(Arc::new(mapper));
        self
    }

    pub fn build(self) -> TypeMapperRegistry {
        TypeMapperRegistry {
            mappers: self.mappers,
            fallback: self
                .fallback
                .unwrap_or_else(|| Arc::new(DefaultTypeMapper)),
        }
    }
}

/// Shareable registry handle with copy-on-write updates
#[derive(Clone)]
pub struct SharedTypeMapperRegistry {
    current: Arc<ArcSwap<TypeMapperRegistry>>,
    writer: Arc<Mutex<()>>,
}

impl SharedTypeMapperRegistry {
    pub fn new(registry: TypeMapperRegistry) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(registry)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Current table; stays valid even if an update swaps in a new one
    pub fn snapshot(&self) -> Arc<TypeMapperRegistry> {
        self.current.load_full()
    }

    /// Build a new table from a copy of the current one and publish it.
    ///
    /// Writers are serialized; on error the current table is kept.
    pub fn update<F>(&self, f: F) -> Result<(), MappingError>
    where
        F: FnOnce(TypeMapperRegistryBuilder) -> Result<TypeMapperRegistryBuilder, MappingError>,
    {
        let _guard = self.writer.lock();
        let next = f(self.current.load().to_builder())?.build();
        tracing::debug!(mappers = next.len(), "publishing updated type mapper registry");
        self.current.store(Arc::new(next));
        Ok(())
    }
}

impl From<TypeMapperRegistry> for SharedTypeMapperRegistry {
    fn from(registry: TypeMapperRegistry) -> Self {
        Self::new(registry)
    }
}
