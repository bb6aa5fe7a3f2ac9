//! User conversion, including nested address and contact collections.

use std::sync::Arc;

use super::{
    AddressMapper, ContactMapper, EntityMapper, MappingError, apply_children, overwrite_optional,
    record_dto, required,
};
use crate::domain::{
    AssociationRegistry, CollectionStrategy, Entity, EntityId, EntityKind, MappingScope, User,
    UserDto, UserProfile,
};

/// Ids of existing children patched in place, per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchedChildren {
    pub addresses: Vec<EntityId>,
    pub contacts: Vec<EntityId>,
}

/// Maps users and delegates nested children to the child mappers.
#[derive(Debug, Clone)]
pub struct UserMapper {
    registry: Arc<AssociationRegistry>,
    addresses: AddressMapper,
    contacts: ContactMapper,
}

impl UserMapper {
    pub fn new(registry: Arc<AssociationRegistry>) -> Self {
        Self {
            addresses: AddressMapper::new(Arc::clone(&registry)),
            contacts: ContactMapper::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// Reconcile nested collections in `dto` with the user's loaded children.
    ///
    /// Collections absent from the payload are left untouched.
    pub fn apply_collections(
        &self,
        dto: &UserDto,
        user: &mut User,
        strategy: CollectionStrategy,
    ) -> Result<PatchedChildren, MappingError> {
        Ok(PatchedChildren {
            addresses: apply_children(&self.addresses, user, dto.addresses.as_deref(), strategy)?,
            contacts: apply_children(&self.contacts, user, dto.contacts.as_deref(), strategy)?,
        })
    }
}

impl EntityMapper for UserMapper {
    type Entity = User;
    type Dto = UserDto;

    fn to_dto(&self, user: &User) -> UserDto {
        UserDto {
            record: record_dto(user.record(), false),
            username: Some(user.username().to_owned()),
            password: None,
            first_name: user.profile.first_name.clone(),
            last_name: user.profile.last_name.clone(),
            birth_day: user.profile.birth_day,
            addresses: Some(Vec::new()),
            contacts: Some(Vec::new()),
        }
    }

    fn to_dto_scoped(&self, user: &User, scope: &MappingScope<'_>) -> Result<UserDto, MappingError> {
        let mut dto = self.to_dto(user);
        dto.record = record_dto(user.record(), scope.include_audit());
        for descriptor in self.registry.associations(EntityKind::User) {
            let field = descriptor.field_name;
            if !scope.includes(field) {
                continue;
            }
            let nested = scope.nested(field);
            match field {
                "addresses" => {
                    let addresses = user
                        .addresses()?
                        .iter()
                        .map(|address| self.addresses.to_dto_scoped(address, &nested))
                        .collect::<Result<Vec<_>, _>>()?;
                    dto.addresses = Some(addresses);
                }
                "contacts" => {
                    let contacts = user
                        .contacts()?
                        .iter()
                        .map(|contact| self.contacts.to_dto_scoped(contact, &nested))
                        .collect::<Result<Vec<_>, _>>()?;
                    dto.contacts = Some(contacts);
                }
                other => {
                    return Err(MappingError::Unsupported {
                        entity: EntityKind::User,
                        field: other.to_owned(),
                    });
                }
            }
        }
        Ok(dto)
    }

    fn to_entity(&self, dto: &UserDto) -> Result<User, MappingError> {
        let username = required(dto.username.as_ref(), EntityKind::User, "username")?;
        let mut user = User::new(username);
        user.profile = UserProfile {
            first_name: dto.first_name.clone(),
            last_name: dto.last_name.clone(),
            birth_day: dto.birth_day,
        };
        Ok(user)
    }

    fn partial_update(&self, dto: &UserDto, user: &mut User) {
        let profile = &mut user.profile;
        overwrite_optional(&mut profile.first_name, dto.first_name.as_ref());
        overwrite_optional(&mut profile.last_name, dto.last_name.as_ref());
        overwrite_optional(&mut profile.birth_day, dto.birth_day.as_ref());
    }

    fn dto_id(&self, dto: &UserDto) -> Option<EntityId> {
        dto.record.id
    }
}
