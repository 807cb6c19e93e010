//! Entity Mapper Module
//!
//! Maps query result rows into typed entities through per-type, per-dialect
//! type mappers, converts entity fields into statement parameters, and
//! resolves declared one-to-many and many-to-one relationships through
//! repository capabilities.

// Public exports
pub mod contract;
pub use contract::{
    DbValue, Dialect, Entity, ManyToOne, MappingError, OneToMany, Point, RelationField, RowCursor,
};

pub mod config;
pub use config::{Config, NativeEnumConfig};

pub mod domain;
pub use domain::{
    BoundParameter, EntityMapper, ForeignKeyRepository, FromRow, MappedRow, MappedType,
    ParameterSet, RelationshipRegistry, RelationshipResolver, SharedTypeMapperRegistry,
    ToParameters, TypeKey, TypeMapper, TypeMapperRegistry,
};

pub mod module;
pub use module::EntityMapperModule;

pub mod infra;
pub use infra::storage::{InMemoryRowRepository, JsonRow, SeaOrmForeignKeyRepository};
