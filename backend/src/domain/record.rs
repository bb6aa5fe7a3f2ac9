//! Identity, audit metadata, and association state shared by every entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityKind;

/// Storage-assigned primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Creation and modification metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub created_by: String,
    pub modified_by: String,
}

impl Audit {
    /// Metadata for a record created at `at` by `actor`.
    pub fn created(at: DateTime<Utc>, actor: impl Into<String>) -> Self {
        let actor = actor.into();
        Self {
            created_date: at,
            modified_date: at,
            created_by: actor.clone(),
            modified_by: actor,
        }
    }

    /// Record a modification, keeping the creation fields.
    pub fn touch(&mut self, at: DateTime<Utc>, actor: impl Into<String>) {
        self.modified_date = at;
        self.modified_by = actor.into();
    }
}

/// Identity plus audit block embedded in every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub id: Option<EntityId>,
    pub audit: Option<Audit>,
}

impl Record {
    /// Record for a persisted row.
    pub fn persisted(id: EntityId, audit: Option<Audit>) -> Self {
        Self {
            id: Some(id),
            audit,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Raised when code reads an association the loader did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("association {entity}.{field} was not loaded")]
pub struct UnresolvedAssociation {
    pub entity: EntityKind,
    pub field: &'static str,
}

/// Two-phase association state.
///
/// Loaders either resolve an association or leave it `Unresolved`; reading an
/// unresolved association is an error, never an empty collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Association<T> {
    Unresolved,
    Loaded(T),
}

impl<T> Default for Association<T> {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl<T> Association<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Loaded value, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Unresolved => None,
        }
    }

    /// Loaded value or an [`UnresolvedAssociation`] naming the field.
    pub fn require(
        &self,
        entity: EntityKind,
        field: &'static str,
    ) -> Result<&T, UnresolvedAssociation> {
        self.get().ok_or(UnresolvedAssociation { entity, field })
    }

    /// Mutable variant of [`Association::require`].
    pub fn require_mut(
        &mut self,
        entity: EntityKind,
        field: &'static str,
    ) -> Result<&mut T, UnresolvedAssociation> {
        match self {
            Self::Loaded(value) => Ok(value),
            Self::Unresolved => Err(UnresolvedAssociation { entity, field }),
        }
    }
}

/// Common surface of persisted entities.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn id(&self) -> Option<EntityId> {
        self.record().id
    }
}
