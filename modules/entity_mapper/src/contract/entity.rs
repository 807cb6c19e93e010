//! Entity identity contract and relationship field states

use super::model::DbValue;

/// Identity capability every mapped entity implements.
///
/// Lets the resolver and repository collaborators work over any entity
/// without per-type code.
pub trait Entity: Send + Sync + 'static {
    /// Identifier type
    type Id: Clone + Into<DbValue> + Send + Sync;

    /// Scalar field names declared on the entity, used to validate
    /// foreign-key references at registration time
    const FIELDS: &'static [&'static str];

    /// Field holding the identifier, looked up by many-to-one relationships
    const ID_FIELD: &'static str = "id";

    /// Short type name used in diagnostics
    fn entity_type() -> &'static str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// Current identifier; `None` until the entity has been persisted
    fn id(&self) -> Option<Self::Id>;

    /// Assign the identifier
    fn set_id(&mut self, id: Self::Id);

    /// Identifier as a boxed value, `DbValue::Null` when absent
    fn id_value(&self) -> DbValue {
        self.id().map_or(DbValue::Null, Into::into)
    }
}

/// State of a relationship field on an owning entity.
///
/// A field starts `Unresolved` and becomes `Resolved` once the resolver has
/// fetched (or skipped fetching) its children.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RelationField<V> {
    #[default]
    Unresolved,
    Resolved(V),
}

/// Collection side of a one-to-many relationship
pub type OneToMany<C> = RelationField<Vec<C>>;

/// Reference side of a many-to-one (foreign-key join) relationship
pub type ManyToOne<T> = RelationField<Option<T>>;

impl<V> RelationField<V> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RelationField::Resolved(_))
    }

    /// Resolved value, if any
    pub fn get(&self) -> Option<&V> {
        match self {
            RelationField::Resolved(v) => Some(v),
            RelationField::Unresolved => None,
        }
    }

    pub fn into_resolved(self) -> Option<V> {
        match self {
            RelationField::Resolved(v) => Some(v),
            RelationField::Unresolved => None,
        }
    }
}

impl<C> RelationField<Vec<C>> {
    /// Children of a resolved collection; empty while unresolved
    pub fn items(&self) -> &[C] {
        self.get().map(Vec::as_slice).unwrap_or_default()
    }
}
