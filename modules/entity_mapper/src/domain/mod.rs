//! Domain layer - mapping engine and relationship resolution

pub mod mapper;
pub mod parameters;
pub mod registry;
pub mod relationship;
pub mod repository;
pub mod resolver;
pub mod row_mapper;

pub use mapper::{normalize_numeric, DefaultTypeMapper, TypeKey, TypeMapper};
pub use parameters::{BoundParameter, ParameterSet, ToParameters};
pub use registry::{SharedTypeMapperRegistry, TypeMapperRegistry, TypeMapperRegistryBuilder};
pub use relationship::{
    RelationshipInfo, RelationshipKind, RelationshipRegistry, RelationshipRegistryBuilder,
};
pub use repository::ForeignKeyRepository;
pub use resolver::RelationshipResolver;
pub use row_mapper::{EntityMapper, FromRow, MappedRow, MappedType};
