//! Module assembly - wires configuration into the mapper and resolver

use crate::config::Config;
use crate::contract::MappingError;
use crate::domain::{
    EntityMapper, RelationshipRegistry, RelationshipResolver, SharedTypeMapperRegistry,
    TypeMapperRegistry,
};
use std::sync::Arc;

/// Entity mapper module: one type mapper table, one relationship table
#[derive(Clone)]
pub struct EntityMapperModule {
    config: Arc<Config>,
    mapper: EntityMapper,
    resolver: RelationshipResolver,
}

impl EntityMapperModule {
    /// Build the built-in mapper table from `config` and bind the declared
    /// relationships.
    pub fn init(config: Config, relationships: RelationshipRegistry) -> Result<Self, MappingError> {
        let registry = SharedTypeMapperRegistry::new(TypeMapperRegistry::with_builtins(&config)?);
        let mapper = EntityMapper::new(registry, config.dialect);
        let resolver = RelationshipResolver::with_config(Arc::new(relationships), &config);

        tracing::info!(
            dialect = config.dialect.map_or("generic", |d| d.name()),
            mappers = mapper.registry().snapshot().len(),
            relationship_owners = resolver.registry().owner_count(),
            "entity mapper initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            mapper,
            resolver,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    pub fn resolver(&self) -> &RelationshipResolver {
        &self.resolver
    }
}
