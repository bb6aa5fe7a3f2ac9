//! Entity and DTO conversion driven by [`MappingOptions`].
//!
//! `to_dto` produces the minimal shape and never touches associations, so it
//! cannot fail. `to_dto_with_options` starts from that shape and fills in
//! whatever the options include; every association the options exclude is
//! set to an explicit empty value. Reading an association the loader left
//! unresolved is a [`MappingError`], never an empty collection.

mod address_mapper;
mod children;
mod contact_mapper;
mod user_mapper;

pub use address_mapper::AddressMapper;
pub use contact_mapper::ContactMapper;
pub use user_mapper::{PatchedChildren, UserMapper};

pub(crate) use children::apply_children;

use tracing::error;

use super::{
    AuditDto, Entity, EntityKind, Error, MappingOptions, MappingScope, Record, RecordDto,
    UnresolvedAssociation,
};

/// Conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// Options included an association the loader did not resolve.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedAssociation),
    /// A required scalar was absent when building a new entity.
    #[error("{entity}.{field} is required")]
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },
    /// A registered association has no conversion.
    #[error("{entity}.{field} has no mapping")]
    Unsupported { entity: EntityKind, field: String },
}

impl From<MappingError> for Error {
    fn from(value: MappingError) -> Self {
        match value {
            MappingError::MissingField { field, .. } => {
                let mut fields = std::collections::BTreeMap::new();
                fields.insert(field.to_owned(), format!("{field} is required"));
                Error::validation(fields)
            }
            other => {
                error!(error = %other, "entity graph did not match the mapping request");
                Error::internal(other.to_string())
            }
        }
    }
}

/// Bidirectional entity and DTO conversion.
pub trait EntityMapper: Send + Sync + 'static {
    type Entity: Entity;
    type Dto: Send + Sync + 'static;

    /// Scalars and id only; audit cleared, associations empty.
    fn to_dto(&self, entity: &Self::Entity) -> Self::Dto;

    /// Convert from a nested position in the object graph.
    fn to_dto_scoped(
        &self,
        entity: &Self::Entity,
        scope: &MappingScope<'_>,
    ) -> Result<Self::Dto, MappingError>;

    /// Full conversion honouring `options`.
    fn to_dto_with_options(
        &self,
        entity: &Self::Entity,
        options: &MappingOptions,
    ) -> Result<Self::Dto, MappingError> {
        self.to_dto_scoped(entity, &options.scope())
    }

    /// Convert a list with the same options.
    fn to_dto_list(
        &self,
        entities: &[Self::Entity],
        options: &MappingOptions,
    ) -> Result<Vec<Self::Dto>, MappingError> {
        entities
            .iter()
            .map(|entity| self.to_dto_with_options(entity, options))
            .collect()
    }

    /// Build a new entity from scalar fields. No id, no audit, no
    /// associations.
    fn to_entity(&self, dto: &Self::Dto) -> Result<Self::Entity, MappingError>;

    /// Overwrite entity scalars with the DTO's non-null values. Identity,
    /// audit, natural keys, and associations are left alone.
    fn partial_update(&self, dto: &Self::Dto, entity: &mut Self::Entity);

    /// Id carried by a DTO.
    fn dto_id(&self, dto: &Self::Dto) -> Option<super::EntityId>;
}

/// Record block for a DTO, with audit stripped unless requested.
fn record_dto(record: &Record, include_audit: bool) -> RecordDto {
    let mut dto = RecordDto {
        id: record.id,
        audit: record.audit.as_ref().map(AuditDto::from),
    };
    if !include_audit {
        dto.strip_audit();
    }
    dto
}

fn required<T: Clone>(
    value: Option<&T>,
    entity: EntityKind,
    field: &'static str,
) -> Result<T, MappingError> {
    value
        .cloned()
        .ok_or(MappingError::MissingField { entity, field })
}

fn overwrite<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn overwrite_optional<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

#[cfg(test)]
mod tests;
