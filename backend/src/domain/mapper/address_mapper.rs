//! Address conversion.

use std::sync::Arc;

use super::{EntityMapper, MappingError, overwrite, overwrite_optional, record_dto, required};
use crate::domain::{
    Address, AddressDetails, AddressDto, AssociationRegistry, Entity, EntityId, EntityKind,
    MappingScope, OwnedByUser, UserRef, UserSummaryDto,
};

#[derive(Debug, Clone)]
pub struct AddressMapper {
    registry: Arc<AssociationRegistry>,
}

impl AddressMapper {
    pub fn new(registry: Arc<AssociationRegistry>) -> Self {
        Self { registry }
    }
}

pub(super) fn summary(owner: &UserRef) -> UserSummaryDto {
    UserSummaryDto {
        id: owner.id,
        username: owner.username.clone(),
    }
}

impl EntityMapper for AddressMapper {
    type Entity = Address;
    type Dto = AddressDto;

    fn to_dto(&self, address: &Address) -> AddressDto {
        let details = &address.details;
        AddressDto {
            record: record_dto(address.record(), false),
            address_type: Some(details.address_type),
            street: Some(details.street.clone()),
            post_zip_code: Some(details.post_zip_code.clone()),
            province: details.province.clone(),
            city: Some(details.city.clone()),
            country: Some(details.country.clone()),
            user_id: address.user_id(),
            user: None,
        }
    }

    fn to_dto_scoped(
        &self,
        address: &Address,
        scope: &MappingScope<'_>,
    ) -> Result<AddressDto, MappingError> {
        let mut dto = self.to_dto(address);
        dto.record = record_dto(address.record(), scope.include_audit());
        for descriptor in self.registry.associations(EntityKind::Address) {
            if !scope.includes(descriptor.field_name) {
                continue;
            }
            match descriptor.field_name {
                "user" => {
                    let owner = address.owner().user().require(EntityKind::Address, "user")?;
                    dto.user = owner.as_ref().map(summary);
                }
                other => {
                    return Err(MappingError::Unsupported {
                        entity: EntityKind::Address,
                        field: other.to_owned(),
                    });
                }
            }
        }
        Ok(dto)
    }

    fn to_entity(&self, dto: &AddressDto) -> Result<Address, MappingError> {
        let kind = EntityKind::Address;
        Ok(Address::new(AddressDetails {
            address_type: required(dto.address_type.as_ref(), kind, "type")?,
            street: required(dto.street.as_ref(), kind, "street")?,
            post_zip_code: required(dto.post_zip_code.as_ref(), kind, "postZipCode")?,
            province: dto.province.clone(),
            city: required(dto.city.as_ref(), kind, "city")?,
            country: required(dto.country.as_ref(), kind, "country")?,
        }))
    }

    fn partial_update(&self, dto: &AddressDto, address: &mut Address) {
        let details = &mut address.details;
        overwrite(&mut details.address_type, dto.address_type.as_ref());
        overwrite(&mut details.street, dto.street.as_ref());
        overwrite(&mut details.post_zip_code, dto.post_zip_code.as_ref());
        overwrite_optional(&mut details.province, dto.province.as_ref());
        overwrite(&mut details.city, dto.city.as_ref());
        overwrite(&mut details.country, dto.country.as_ref());
    }

    fn dto_id(&self, dto: &AddressDto) -> Option<EntityId> {
        dto.record.id
    }
}
