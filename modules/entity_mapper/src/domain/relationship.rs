//! Relationship descriptors
//!
//! Relationships are declared once at startup into a [`RelationshipRegistry`]
//! keyed by owning entity type. Each declaration knows how to read its lookup
//! key from the owner, how to fetch the related rows, and which field of the
//! owner receives them.

use super::repository::ForeignKeyRepository;
use crate::contract::{DbValue, Entity, ManyToOne, MappingError, OneToMany, RelationField};
use async_trait::async_trait;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Deferred write of fetched data into the owner's relationship field
pub type Assignment<P> = Box<dyn FnOnce(&mut P) + Send>;

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Children whose foreign key equals the owner's id
    OneToMany,
    /// Target whose id equals the owner's foreign key
    ManyToOne,
}

/// Introspection view of a declared relationship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipInfo {
    pub owner_type: &'static str,
    pub field_name: &'static str,
    /// Field the lookup filters on
    pub foreign_key_field: &'static str,
    pub element_type: &'static str,
    pub repository: String,
    pub kind: RelationshipKind,
}

/// A declared relationship on owner type `P`
#[async_trait]
pub trait Relationship<P: Entity>: Send + Sync {
    fn info(&self) -> &RelationshipInfo;

    /// Value the lookup filters by; `DbValue::Null` means nothing to fetch
    fn lookup_key(&self, owner: &P) -> DbValue;

    /// Fetch the related rows for `key` and return their assignment
    async fn fetch(&self, key: &DbValue) -> anyhow::Result<Assignment<P>>;

    /// Mark the field resolved with no related rows
    fn assign_empty(&self, owner: &mut P);
}

/// One-to-many: children of type `C` whose foreign key equals the owner id
pub struct HasMany<P, C> {
    info: RelationshipInfo,
    repository: Arc<dyn ForeignKeyRepository<C>>,
    slot: fn(&mut P) -> &mut OneToMany<C>,
}

#[async_trait]
impl<P: Entity, C: Entity> Relationship<P> for HasMany<P, C> {
    fn info(&self) -> &RelationshipInfo {
        &self.info
    }

    fn lookup_key(&self, owner: &P) -> DbValue {
        owner.id_value()
    }

    async fn fetch(&self, key: &DbValue) -> anyhow::Result<Assignment<P>> {
        let children = self
            .repository
            .find_by_foreign_key(self.info.foreign_key_field, key)
            .await?;
        tracing::debug!(
            owner = self.info.owner_type,
            field = self.info.field_name,
            count = children.len(),
            "fetched related rows"
        );
        let slot = self.slot;
        Ok(Box::new(move |owner: &mut P| {
            *slot(owner) = RelationField::Resolved(children);
        }))
    }

    fn assign_empty(&self, owner: &mut P) {
        *(self.slot)(owner) = RelationField::Resolved(Vec::new());
    }
}

/// Many-to-one: the target `T` whose id equals the owner's foreign key
pub struct BelongsTo<P, T> {
    info: RelationshipInfo,
    repository: Arc<dyn ForeignKeyRepository<T>>,
    key_of: fn(&P) -> DbValue,
    slot: fn(&mut P) -> &mut ManyToOne<T>,
}

#[async_trait]
impl<P: Entity, T: Entity> Relationship<P> for BelongsTo<P, T> {
    fn info(&self) -> &RelationshipInfo {
        &self.info
    }

    fn lookup_key(&self, owner: &P) -> DbValue {
        (self.key_of)(owner)
    }

    async fn fetch(&self, key: &DbValue) -> anyhow::Result<Assignment<P>> {
        let matches = self
            .repository
            .find_by_foreign_key(T::ID_FIELD, key)
            .await?;
        if matches.len() > 1 {
            tracing::warn!(
                owner = self.info.owner_type,
                field = self.info.field_name,
                count = matches.len(),
                "many-to-one lookup matched several rows, keeping the first"
            );
        }
        let target = matches.into_iter().next();
        let slot = self.slot;
        Ok(Box::new(move |owner: &mut P| {
            *slot(owner) = RelationField::Resolved(target);
        }))
    }

    fn assign_empty(&self, owner: &mut P) {
        *(self.slot)(owner) = RelationField::Resolved(None);
    }
}

struct OwnerEntry {
    /// Full `std::any::type_name` of the owner
    type_path: &'static str,
    /// `Vec<Arc<dyn Relationship<P>>>` for the owner type
    relationships: Box<dyn Any + Send + Sync>,
    infos: Vec<RelationshipInfo>,
}

/// Relationship table keyed by owning entity type, immutable once built
#[derive(Default)]
pub struct RelationshipRegistry {
    owners: HashMap<TypeId, OwnerEntry>,
}

impl RelationshipRegistry {
    pub fn builder() -> RelationshipRegistryBuilder {
        RelationshipRegistryBuilder::default()
    }

    /// Relationships declared on `P`, in declaration order
    pub fn relationships<P: Entity>(&self) -> &[Arc<dyn Relationship<P>>] {
        self.owners
            .get(&TypeId::of::<P>())
            .and_then(|entry| {
                entry
                    .relationships
                    .downcast_ref::<Vec<Arc<dyn Relationship<P>>>>()
            })
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Descriptors declared on `P`, in declaration order
    pub fn descriptors<P: Entity>(&self) -> &[RelationshipInfo] {
        self.owners
            .get(&TypeId::of::<P>())
            .map(|entry| entry.infos.as_slice())
            .unwrap_or_default()
    }

    /// Descriptors for an owner identified by name.
    ///
    /// `owner_type` is either the full type path or the short type name. A
    /// short name shared by several owner types matches none of them.
    pub fn descriptors_by_name(&self, owner_type: &str) -> &[RelationshipInfo] {
        if let Some(entry) = self.owners.values().find(|e| e.type_path == owner_type) {
            return entry.infos.as_slice();
        }
        let mut matches = self.owners.values().filter(|entry| {
            entry
                .infos
                .first()
                .is_some_and(|info| info.owner_type == owner_type)
        });
        match (matches.next(), matches.next()) {
            (Some(entry), None) => entry.infos.as_slice(),
            _ => &[],
        }
    }

    /// Number of owner types with at least one relationship
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }
}

/// Builder for [`RelationshipRegistry`]; validates every declaration
#[derive(Default)]
pub struct RelationshipRegistryBuilder {
    owners: HashMap<TypeId, OwnerEntry>,
}

impl RelationshipRegistryBuilder {
    /// Declare a one-to-many relationship.
    ///
    /// `foreign_key_field` must be a field of `C`; its value is compared
    /// against the owner's id.
    pub fn has_many<P: Entity, C: Entity>(
        self,
        field_name: &'static str,
        foreign_key_field: &'static str,
        repository: Arc<dyn ForeignKeyRepository<C>>,
        slot: fn(&mut P) -> &mut OneToMany<C>,
    ) -> Result<Self, MappingError> {
        check_field::<P, C>(field_name, foreign_key_field)?;
        let info = RelationshipInfo {
            owner_type: P::entity_type(),
            field_name,
            foreign_key_field,
            element_type: C::entity_type(),
            repository: repository.name().to_string(),
            kind: RelationshipKind::OneToMany,
        };
        self.declare::<P>(Arc::new(HasMany {
            info,
            repository,
            slot,
        }))
    }

    /// Declare a many-to-one relationship.
    ///
    /// `foreign_key_field` must be a field of `P` and `key_of` must read it;
    /// the target is looked up by its id field.
    pub fn belongs_to<P: Entity, T: Entity>(
        self,
        field_name: &'static str,
        foreign_key_field: &'static str,
        repository: Arc<dyn ForeignKeyRepository<T>>,
        key_of: fn(&P) -> DbValue,
        slot: fn(&mut P) -> &mut ManyToOne<T>,
    ) -> Result<Self, MappingError> {
        check_field::<P, P>(field_name, foreign_key_field)?;
        check_field::<P, T>(field_name, T::ID_FIELD)?;
        let info = RelationshipInfo {
            owner_type: P::entity_type(),
            field_name,
            foreign_key_field,
            element_type: T::entity_type(),
            repository: repository.name().to_string(),
            kind: RelationshipKind::ManyToOne,
        };
        self.declare::<P>(Arc::new(BelongsTo {
            info,
            repository,
            key_of,
            slot,
        }))
    }

    fn declare<P: Entity>(mut self, relationship: Arc<dyn Relationship<P>>) -> Result<Self, MappingError> {
        let info = relationship.info().clone();
        let entry = self
            .owners
            .entry(TypeId::of::<P>())
            .or_insert_with(|| OwnerEntry {
                type_path: std::any::type_name::<P>(),
                relationships: Box::new(Vec::<Arc<dyn Relationship<P>>>::new()),
                infos: Vec::new(),
            });

        if entry.infos.iter().any(|i| i.field_name == info.field_name) {
            return Err(MappingError::InvalidDescriptor {
                entity_type: info.owner_type,
                field: info.field_name.to_string(),
                reason: "relationship declared twice".to_string(),
            });
        }

        let relationships = entry
            .relationships
            .downcast_mut::<Vec<Arc<dyn Relationship<P>>>>()
            .ok_or_else(|| MappingError::InvalidDescriptor {
                entity_type: info.owner_type,
                field: info.field_name.to_string(),
                reason: "relationship table holds another owner type".to_string(),
            })?;

        tracing::debug!(
            owner = info.owner_type,
            field = info.field_name,
            foreign_key = info.foreign_key_field,
            element = info.element_type,
            repository = %info.repository,
            "declared relationship"
        );
        relationships.push(relationship);
        entry.infos.push(info);
        Ok(self)
    }

    pub fn build(self) -> RelationshipRegistry {
        RelationshipRegistry {
            owners: self.owners,
        }
    }
}

/// Ensure `field` is a declared field of `E`
fn check_field<P: Entity, E: Entity>(
    relationship: &'static str,
    field: &'static str,
) -> Result<(), MappingError> {
    if E::FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(MappingError::InvalidDescriptor {
            entity_type: P::entity_type(),
            field: relationship.to_string(),
            reason: format!("'{field}' is not a field of {}", E::entity_type()),
        })
    }
}
