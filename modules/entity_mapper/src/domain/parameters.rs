//! Entity-to-statement parameter binding

use super::mapper::TypeKey;
use super::registry::TypeMapperRegistry;
use super::row_mapper::MappedType;
use crate::contract::{DbValue, Dialect, MappingError};

/// One named statement parameter after write-side conversion
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Parameter name, without the placeholder sigil
    pub name: String,
    /// Placeholder expression to splice into the statement text
    pub placeholder: String,
    /// Converted value to bind
    pub value: DbValue,
}

/// Entity whose fields can be written as statement parameters
pub trait ToParameters {
    fn to_parameters(&self, params: &mut ParameterSet<'_>) -> Result<(), MappingError>;
}

/// Ordered parameter list for one statement
pub struct ParameterSet<'a> {
    registry: &'a TypeMapperRegistry,
    dialect: Option<Dialect>,
    params: Vec<BoundParameter>,
}

impl<'a> ParameterSet<'a> {
    pub fn new(registry: &'a TypeMapperRegistry, dialect: Option<Dialect>) -> Self {
        Self {
            registry,
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind a field using the mapper registered for its host type
    pub fn bind<T: MappedType>(&mut self, name: &str, value: &T) -> Result<&mut Self, MappingError> {
        self.bind_as(&T::TYPE_KEY, name, value)
    }

    /// Bind a field using the mapper registered for `key`
    pub fn bind_as<T: MappedType>(
        &mut self,
        key: &TypeKey,
        name: &str,
        value: &T,
    ) -> Result<&mut Self, MappingError> {
        let mapper = self.registry.resolver_for(key, self.dialect);
        let value = mapper
            .to_database(value.to_db_value())
            .map_err(|e| e.at_column(name))?;
        self.params.push(BoundParameter {
            name: name.to_string(),
            placeholder: mapper.format_parameter(name),
            value,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn into_parameters(self) -> Vec<BoundParameter> {
        self.params
    }
}
