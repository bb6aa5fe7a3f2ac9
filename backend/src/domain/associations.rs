//! Association metadata registry.
//!
//! Declares, per entity kind, which fields are traversable associations. Both
//! the fetch plan builder and the mappers consult the same registry, so a
//! field that is not declared here can never be joined or serialized as a
//! nested object, even if the entity physically carries it.
//!
//! The registry is assembled once at startup through
//! [`AssociationRegistry::builder`]; declaration mistakes fail the build rather
//! than surfacing on a request. After that it is read-only and shared behind an
//! `Arc`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Entity kinds exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityKind {
    User,
    Address,
    Contact,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Address, Self::Contact];

    /// Human-readable name used in messages and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Address => "Address",
            Self::Contact => "Contact",
        }
    }

    /// Client-facing scalar field names; these are always part of a response.
    pub const fn scalar_fields(self) -> &'static [&'static str] {
        match self {
            Self::User => &["id", "username", "firstName", "lastName", "birthDay"],
            Self::Address => &[
                "id",
                "type",
                "street",
                "postZipCode",
                "province",
                "city",
                "country",
                "userId",
            ],
            Self::Contact => &["id", "contactType", "phoneNumber", "email", "userId"],
        }
    }

    /// Whether `field` is one of this kind's scalar fields.
    pub fn is_scalar(self, field: &str) -> bool {
        self.scalar_fields().contains(&field)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One traversable association declared on an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationDescriptor {
    pub field_name: &'static str,
    /// Element type for collections, referenced type otherwise.
    pub target: EntityKind,
    pub is_collection: bool,
    /// Whether a path may continue past this field.
    pub allows_sub_paths: bool,
}

impl AssociationDescriptor {
    /// Collection-valued association.
    pub const fn collection(field_name: &'static str, target: EntityKind) -> Self {
        Self {
            field_name,
            target,
            is_collection: true,
            allows_sub_paths: true,
        }
    }

    /// Single-valued association.
    pub const fn reference(field_name: &'static str, target: EntityKind) -> Self {
        Self {
            field_name,
            target,
            is_collection: false,
            allows_sub_paths: true,
        }
    }

    /// Forbid path continuation past this field.
    #[must_use]
    pub const fn terminal(mut self) -> Self {
        self.allows_sub_paths = false;
        self
    }
}

/// Lookup failure for a field that is not a declared association.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{field}' is not a traversable association of {entity}")]
pub struct UnknownAssociation {
    pub entity: EntityKind,
    pub field: String,
}

/// Declaration mistakes caught when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{entity} declares association '{field}' more than once")]
    DuplicateAssociation { entity: EntityKind, field: String },
    #[error("{entity} association '{field}' shadows a scalar field")]
    ShadowsScalar { entity: EntityKind, field: String },
    #[error("{entity} association '{field}' targets unregistered {target}")]
    UnregisteredTarget {
        entity: EntityKind,
        field: String,
        target: EntityKind,
    },
}

/// Read-only association metadata for every registered entity kind.
///
/// # Examples
/// ```
/// use user_service::domain::{AssociationRegistry, EntityKind};
///
/// let registry = AssociationRegistry::standard().expect("declarations are consistent");
/// let addresses = registry.describe(EntityKind::User, "addresses").expect("declared");
/// assert!(addresses.is_collection);
/// assert!(registry.describe(EntityKind::User, "password").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRegistry {
    entities: BTreeMap<EntityKind, Vec<AssociationDescriptor>>,
}

impl AssociationRegistry {
    /// Start declaring a registry.
    pub fn builder() -> AssociationRegistryBuilder {
        AssociationRegistryBuilder::default()
    }

    /// The service's declarations: users own address and contact
    /// collections; addresses and contacts reference their user without
    /// allowing further traversal.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::builder()
            .entity(EntityKind::User)
            .entity(EntityKind::Address)
            .entity(EntityKind::Contact)
            .association(
                EntityKind::User,
                AssociationDescriptor::collection("addresses", EntityKind::Address),
            )
            .association(
                EntityKind::User,
                AssociationDescriptor::collection("contacts", EntityKind::Contact),
            )
            .association(
                EntityKind::Address,
                AssociationDescriptor::reference("user", EntityKind::User).terminal(),
            )
            .association(
                EntityKind::Contact,
                AssociationDescriptor::reference("user", EntityKind::User).terminal(),
            )
            .build()
    }

    /// Resolve `field` on `entity`.
    pub fn describe(
        &self,
        entity: EntityKind,
        field: &str,
    ) -> Result<&AssociationDescriptor, UnknownAssociation> {
        self.associations(entity)
            .iter()
            .find(|descriptor| descriptor.field_name == field)
            .ok_or_else(|| UnknownAssociation {
                entity,
                field: field.to_owned(),
            })
    }

    /// All associations declared on `entity`; empty for unregistered kinds.
    pub fn associations(&self, entity: EntityKind) -> &[AssociationDescriptor] {
        self.entities.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `field` is a declared association of `entity`.
    pub fn is_association(&self, entity: EntityKind, field: &str) -> bool {
        self.describe(entity, field).is_ok()
    }
}

/// Builder for [`AssociationRegistry`].
#[derive(Debug, Default)]
pub struct AssociationRegistryBuilder {
    entities: BTreeMap<EntityKind, Vec<AssociationDescriptor>>,
}

impl AssociationRegistryBuilder {
    /// Register an entity kind, with or without associations.
    #[must_use]
    pub fn entity(mut self, kind: EntityKind) -> Self {
        self.entities.entry(kind).or_default();
        self
    }

    /// Declare an association on `owner`, registering `owner` if needed.
    #[must_use]
    pub fn association(mut self, owner: EntityKind, descriptor: AssociationDescriptor) -> Self {
        self.entities.entry(owner).or_default().push(descriptor);
        self
    }

    /// Validate every declaration and freeze the registry.
    pub fn build(self) -> Result<AssociationRegistry, RegistryError> {
        for (entity, descriptors) in &self.entities {
            for (index, descriptor) in descriptors.iter().enumerate() {
                let field = descriptor.field_name;
                if descriptors
                    .iter()
                    .skip(index + 1)
                    .any(|other| other.field_name == field)
                {
                    return Err(RegistryError::DuplicateAssociation {
                        entity: *entity,
                        field: field.to_owned(),
                    });
                }
                if entity.is_scalar(field) {
                    return Err(RegistryError::ShadowsScalar {
                        entity: *entity,
                        field: field.to_owned(),
                    });
                }
                if !self.entities.contains_key(&descriptor.target) {
                    return Err(RegistryError::UnregisteredTarget {
                        entity: *entity,
                        field: field.to_owned(),
                        target: descriptor.target,
                    });
                }
            }
        }
        Ok(AssociationRegistry {
            entities: self.entities,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> AssociationRegistry {
        AssociationRegistry::standard().expect("standard declarations are valid")
    }

    #[rstest]
    #[case(EntityKind::User, "addresses", EntityKind::Address, true, true)]
    #[case(EntityKind::User, "contacts", EntityKind::Contact, true, true)]
    #[case(EntityKind::Address, "user", EntityKind::User, false, false)]
    #[case(EntityKind::Contact, "user", EntityKind::User, false, false)]
    fn standard_declarations(
        registry: AssociationRegistry,
        #[case] owner: EntityKind,
        #[case] field: &str,
        #[case] target: EntityKind,
        #[case] is_collection: bool,
        #[case] allows_sub_paths: bool,
    ) {
        let descriptor = registry.describe(owner, field).expect("declared association");
        assert_eq!(descriptor.target, target);
        assert_eq!(descriptor.is_collection, is_collection);
        assert_eq!(descriptor.allows_sub_paths, allows_sub_paths);
    }

    #[rstest]
    #[case(EntityKind::User, "firstName")]
    #[case(EntityKind::User, "password")]
    #[case(EntityKind::Address, "street")]
    #[case(EntityKind::Contact, "addresses")]
    fn undeclared_fields_are_unknown(
        registry: AssociationRegistry,
        #[case] owner: EntityKind,
        #[case] field: &str,
    ) {
        let err = registry.describe(owner, field).expect_err("not an association");
        assert_eq!(err.entity, owner);
        assert_eq!(err.field, field);
    }

    #[test]
    fn duplicate_declarations_fail_the_build() {
        let result = AssociationRegistry::builder()
            .entity(EntityKind::Address)
            .association(
                EntityKind::User,
                AssociationDescriptor::collection("addresses", EntityKind::Address),
            )
            .association(
                EntityKind::User,
                AssociationDescriptor::collection("addresses", EntityKind::Address),
            )
            .build();
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateAssociation { entity: EntityKind::User, .. })
        ));
    }

    #[test]
    fn associations_may_not_shadow_scalars() {
        let result = AssociationRegistry::builder()
            .association(
                EntityKind::User,
                AssociationDescriptor::reference("username", EntityKind::User),
            )
            .build();
        assert!(matches!(result, Err(RegistryError::ShadowsScalar { .. })));
    }

    #[test]
    fn targets_must_be_registered() {
        let result = AssociationRegistry::builder()
            .association(
                EntityKind::User,
                AssociationDescriptor::collection("contacts", EntityKind::Contact),
            )
            .build();
        assert_eq!(
            result,
            Err(RegistryError::UnregisteredTarget {
                entity: EntityKind::User,
                field: "contacts".to_owned(),
                target: EntityKind::Contact,
            })
        );
    }
}
