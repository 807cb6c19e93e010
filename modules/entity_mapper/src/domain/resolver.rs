//! Relationship resolver - populates declared relationship fields
//!
//! For every relationship declared on an owner type the resolver reads the
//! lookup key, asks the relationship's repository for matching rows and
//! assigns them to the field. Fetches for distinct fields (and, in batch mode,
//! distinct owners) run concurrently; assignments are applied afterwards, each
//! touching only its own field.

use super::relationship::{Assignment, Relationship, RelationshipRegistry};
use crate::config::Config;
use crate::contract::{DbValue, Entity, MappingError};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Outcome of one fetch; `None` when the key was null and nothing was fetched
type Fetched<P> = Result<Option<Assignment<P>>, MappingError>;

/// Resolves relationship fields using a shared relationship table
#[derive(Clone)]
pub struct RelationshipResolver {
    registry: Arc<RelationshipRegistry>,
    max_concurrent_fetches: usize,
}

impl RelationshipResolver {
    /// Create a resolver with the default fan-out bound
    pub fn new(registry: Arc<RelationshipRegistry>) -> Self {
        Self::with_config(registry, &Config::default())
    }

    pub fn with_config(registry: Arc<RelationshipRegistry>, config: &Config) -> Self {
        Self {
            registry,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }

    pub fn registry(&self) -> &RelationshipRegistry {
        &self.registry
    }

    /// Resolve every relationship declared on the owner's type.
    ///
    /// On failure every field whose fetch succeeded is still assigned; the
    /// first failure in declaration order is returned.
    pub async fn resolve<P: Entity>(&self, owner: &mut P) -> Result<(), MappingError> {
        let relationships = self.registry.relationships::<P>();
        if relationships.is_empty() {
            return Ok(());
        }

        let keys: Vec<DbValue> = relationships
            .iter()
            .map(|rel| rel.lookup_key(owner))
            .collect();

        let outcomes = futures::future::join_all(
            relationships
                .iter()
                .zip(keys)
                .map(|(rel, key)| fetch(rel.as_ref(), key)),
        )
        .await;

        let mut first_error = None;
        for (rel, outcome) in relationships.iter().zip(outcomes) {
            if let Err(e) = apply(rel.as_ref(), owner, outcome) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Resolve a single declared relationship field
    pub async fn resolve_field<P: Entity>(
        &self,
        owner: &mut P,
        field_name: &str,
    ) -> Result<(), MappingError> {
        let rel = self
            .registry
            .relationships::<P>()
            .iter()
            .find(|rel| rel.info().field_name == field_name)
            .ok_or_else(|| MappingError::InvalidDescriptor {
                entity_type: P::entity_type(),
                field: field_name.to_string(),
                reason: "no relationship declared for this field".to_string(),
            })?;

        let outcome = fetch(rel.as_ref(), rel.lookup_key(owner)).await;
        apply(rel.as_ref(), owner, outcome)
    }

    /// Resolve every relationship of every owner, with at most
    /// `max_concurrent_fetches` fetches in flight.
    ///
    /// Failures follow the same rule as [`resolve`](Self::resolve): all
    /// successful fetches are assigned and the first failure (by owner, then
    /// declaration order) is returned.
    pub async fn resolve_batch<P: Entity>(&self, owners: &mut [P]) -> Result<(), MappingError> {
        let relationships = self.registry.relationships::<P>();
        if relationships.is_empty() || owners.is_empty() {
            return Ok(());
        }

        let jobs: Vec<(usize, usize, DbValue)> = owners
            .iter()
            .enumerate()
            .flat_map(|(owner_idx, owner)| {
                relationships
                    .iter()
                    .enumerate()
                    .map(move |(rel_idx, rel)| (owner_idx, rel_idx, rel.lookup_key(owner)))
            })
            .collect();

        tracing::debug!(
            owner_type = P::entity_type(),
            owners = owners.len(),
            fetches = jobs.len(),
            max_concurrent = self.max_concurrent_fetches,
            "resolving relationship batch"
        );

        let mut outcomes: Vec<(usize, usize, Fetched<P>)> = stream::iter(jobs)
            .map(|(owner_idx, rel_idx, key)| async move {
                let outcome = fetch(relationships[rel_idx].as_ref(), key).await;
                (owner_idx, rel_idx, outcome)
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;
        outcomes.sort_by_key(|(owner_idx, rel_idx, _)| (*owner_idx, *rel_idx));

        let mut first_error = None;
        for (owner_idx, rel_idx, outcome) in outcomes {
            let Some(owner) = owners.get_mut(owner_idx) else {
                continue;
            };
            if let Err(e) = apply(relationships[rel_idx].as_ref(), owner, outcome) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Run one fetch; a null key resolves to `None` without touching the repository
async fn fetch<P: Entity>(rel: &dyn Relationship<P>, key: DbValue) -> Fetched<P> {
    let info = rel.info();
    if key.is_null() {
        tracing::trace!(
            owner = info.owner_type,
            field = info.field_name,
            "null lookup key, skipping fetch"
        );
        return Ok(None);
    }

    tracing::debug!(
        owner = info.owner_type,
        field = info.field_name,
        foreign_key = info.foreign_key_field,
        key = ?key,
        "fetching relationship"
    );
    rel.fetch(&key).await.map(Some).map_err(|source| {
        tracing::warn!(
            owner = info.owner_type,
            field = info.field_name,
            error = %source,
            "relationship fetch failed"
        );
        MappingError::RelationshipResolution {
            entity_type: info.owner_type,
            field: info.field_name,
            source,
        }
    })
}

/// Write a fetch outcome into the owner; failed fields stay as they were
fn apply<P: Entity>(
    rel: &dyn Relationship<P>,
    owner: &mut P,
    outcome: Fetched<P>,
) -> Result<(), MappingError> {
    match outcome? {
        Some(assign) => assign(owner),
        None => rel.assign_empty(owner),
    }
    Ok(())
}
