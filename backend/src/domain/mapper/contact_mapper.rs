//! Contact conversion.

use std::sync::Arc;

use super::address_mapper::summary;
use super::{EntityMapper, MappingError, overwrite, overwrite_optional, record_dto, required};
use crate::domain::{
    AssociationRegistry, Contact, ContactDetails, ContactDto, Entity, EntityId, EntityKind,
    MappingScope, OwnedByUser,
};

#[derive(Debug, Clone)]
pub struct ContactMapper {
    registry: Arc<AssociationRegistry>,
}

impl ContactMapper {
    pub fn new(registry: Arc<AssociationRegistry>) -> Self {
        Self { registry }
    }
}

impl EntityMapper for ContactMapper {
    type Entity = Contact;
    type Dto = ContactDto;

    fn to_dto(&self, contact: &Contact) -> ContactDto {
        let details = &contact.details;
        ContactDto {
            record: record_dto(contact.record(), false),
            contact_type: Some(details.contact_type),
            phone_number: details.phone_number.clone(),
            email: details.email.clone(),
            user_id: contact.user_id(),
            user: None,
        }
    }

    fn to_dto_scoped(
        &self,
        contact: &Contact,
        scope: &MappingScope<'_>,
    ) -> Result<ContactDto, MappingError> {
        let mut dto = self.to_dto(contact);
        dto.record = record_dto(contact.record(), scope.include_audit());
        for descriptor in self.registry.associations(EntityKind::Contact) {
            if !scope.includes(descriptor.field_name) {
                continue;
            }
            match descriptor.field_name {
                "user" => {
                    let owner = contact.owner().user().require(EntityKind::Contact, "user")?;
                    dto.user = owner.as_ref().map(summary);
                }
                other => {
                    return Err(MappingError::Unsupported {
                        entity: EntityKind::Contact,
                        field: other.to_owned(),
                    });
                }
            }
        }
        Ok(dto)
    }

    fn to_entity(&self, dto: &ContactDto) -> Result<Contact, MappingError> {
        Ok(Contact::new(ContactDetails {
            contact_type: required(dto.contact_type.as_ref(), EntityKind::Contact, "contactType")?,
            phone_number: dto.phone_number.clone(),
            email: dto.email.clone(),
        }))
    }

    fn partial_update(&self, dto: &ContactDto, contact: &mut Contact) {
        let details = &mut contact.details;
        overwrite(&mut details.contact_type, dto.contact_type.as_ref());
        overwrite_optional(&mut details.phone_number, dto.phone_number.as_ref());
        overwrite_optional(&mut details.email, dto.email.as_ref());
    }

    fn dto_id(&self, dto: &ContactDto) -> Option<EntityId> {
        dto.record.id
    }
}
