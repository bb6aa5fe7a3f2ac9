//! Orchestration for entities owned by a user.
//!
//! Addresses and contacts are the owning side of their relationship, yet
//! every membership change goes through the owning [`User`] so the loaded
//! collection and the child's foreign key never disagree. Creating a child
//! therefore loads its user, attaches, and saves the linked child; moving a
//! child detaches it from the old user before attaching it to the new one.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::crud_service::{CrudService, ServiceContext, map_repository_error, not_found};
use super::mapper::{AddressMapper, ContactMapper, EntityMapper};
use super::ports::{
    EntityRepository, OwnedEntityRepository, OwnedResourceService, ReadRequest, ResourceService,
};
use super::validation::{Intent, validate_address, validate_contact};
use super::{
    AddressDto, AttributeSelection, ContactDto, Entity, EntityId, EntityKind, Error, FetchPlan,
    OwnedByUser, OwnerLink, User,
};

/// Write payload for a user-owned resource.
pub trait OwnedPayload: Send + Sync + 'static {
    /// Target owner named by the payload.
    fn user_id(&self) -> Option<EntityId>;

    fn validate(&self, intent: Intent) -> Result<(), Error>;
}

impl OwnedPayload for AddressDto {
    fn user_id(&self) -> Option<EntityId> {
        self.user_id
    }

    fn validate(&self, intent: Intent) -> Result<(), Error> {
        validate_address(self, intent)
    }
}

impl OwnedPayload for ContactDto {
    fn user_id(&self) -> Option<EntityId> {
        self.user_id
    }

    fn validate(&self, intent: Intent) -> Result<(), Error> {
        validate_contact(self, intent)
    }
}

/// CRUD for a child kind, keeping the owning user's collection in step.
pub struct OwnedEntityService<R, U, M>
where
    R: OwnedEntityRepository,
{
    crud: CrudService<R, M>,
    users: Arc<U>,
}

/// Address resource service.
pub type AddressService<R, U> = OwnedEntityService<R, U, AddressMapper>;

/// Contact resource service.
pub type ContactService<R, U> = OwnedEntityService<R, U, ContactMapper>;

impl<R, U> OwnedEntityService<R, U, AddressMapper>
where
    R: OwnedEntityRepository<Entity = super::Address>,
    U: EntityRepository<Entity = User>,
{
    pub fn addresses(repository: Arc<R>, users: Arc<U>, context: ServiceContext) -> Self {
        let mapper = AddressMapper::new(Arc::clone(context.registry()));
        Self::new(repository, users, mapper, context)
    }
}

impl<R, U> OwnedEntityService<R, U, ContactMapper>
where
    R: OwnedEntityRepository<Entity = super::Contact>,
    U: EntityRepository<Entity = User>,
{
    pub fn contacts(repository: Arc<R>, users: Arc<U>, context: ServiceContext) -> Self {
        let mapper = ContactMapper::new(Arc::clone(context.registry()));
        Self::new(repository, users, mapper, context)
    }
}

impl<R, U, M> OwnedEntityService<R, U, M>
where
    R: OwnedEntityRepository,
    R::Entity: OwnedByUser,
    U: EntityRepository<Entity = User>,
    M: EntityMapper<Entity = R::Entity>,
    M::Dto: OwnedPayload + serde::Serialize,
{
    pub fn new(repository: Arc<R>, users: Arc<U>, mapper: M, context: ServiceContext) -> Self {
        Self {
            crud: CrudService::new(repository, mapper, context),
            users,
        }
    }

    /// Plan loading the user's collection of this child kind.
    fn owner_plan(&self) -> Result<FetchPlan, Error> {
        self.crud
            .plan_for(EntityKind::User, &[<R::Entity as OwnedByUser>::COLLECTION])
    }

    async fn find_owner(&self, user_id: EntityId) -> Result<Option<User>, Error> {
        let plan = self.owner_plan()?;
        self.users
            .find_by_id_with_plan(user_id, &plan)
            .await
            .map_err(map_repository_error)
    }

    async fn load_owner(&self, user_id: EntityId) -> Result<User, Error> {
        self.find_owner(user_id)
            .await?
            .ok_or_else(|| not_found(EntityKind::User, user_id))
    }

    /// Clone of the child with `id` as it now sits in `owner`'s collection.
    fn linked(owner: &User, id: Option<EntityId>) -> Result<R::Entity, Error> {
        let siblings = <R::Entity as OwnedByUser>::siblings(owner)
            .map_err(|err| Error::from(super::MappingError::from(err)))?;
        let found = match id {
            Some(id) => siblings.iter().find(|child| child.id() == Some(id)),
            None => siblings.iter().rev().find(|child| child.id().is_none()),
        };
        found
            .cloned()
            .ok_or_else(|| Error::internal("attached child missing from owner collection"))
    }

    /// Detach `child` from whichever user currently holds it.
    async fn release(&self, child: R::Entity) -> Result<R::Entity, Error> {
        let (Some(id), Some(user_id)) = (child.id(), child.user_id()) else {
            return Ok(child);
        };
        let Some(mut owner) = self.find_owner(user_id).await? else {
            warn!(%id, %user_id, "child points at a missing user");
            let mut orphan = child;
            *orphan.owner_mut() = OwnerLink::detached();
            return Ok(orphan);
        };
        let detached = <R::Entity as OwnedByUser>::detach_from(&mut owner, id)
            .map_err(|err| Error::from(super::MappingError::from(err)))?;
        Ok(detached.unwrap_or_else(|| {
            let mut orphan = child;
            *orphan.owner_mut() = OwnerLink::detached();
            orphan
        }))
    }
}

#[async_trait]
impl<R, U, M> ResourceService<M::Dto> for OwnedEntityService<R, U, M>
where
    R: OwnedEntityRepository + 'static,
    R::Entity: OwnedByUser,
    U: EntityRepository<Entity = User> + 'static,
    M: EntityMapper<Entity = R::Entity>,
    M::Dto: OwnedPayload + serde::Serialize,
{
    async fn find_by_id(&self, id: EntityId, request: &ReadRequest) -> Result<M::Dto, Error> {
        self.crud.find_by_id(id, request).await
    }

    async fn find_all(&self, request: &ReadRequest) -> Result<Vec<M::Dto>, Error> {
        self.crud.find_all(request).await
    }

    async fn save(&self, dto: M::Dto) -> Result<M::Dto, Error> {
        dto.validate(Intent::Create)?;
        let user_id = dto
            .user_id()
            .ok_or_else(|| Error::invalid_request("userId is required"))?;
        let mut owner = self.load_owner(user_id).await?;

        let mapper = self.crud.mapper();
        let mut child = mapper.to_entity(&dto)?;
        self.crud.context().stamp_created(child.record_mut());
        child
            .attach_to(&mut owner)
            .map_err(|err| Error::from(super::MappingError::from(err)))?;
        let linked = Self::linked(&owner, None)?;

        let saved = self.crud.persist(linked).await?;
        let out = mapper.to_dto(&saved);
        let kind = <R::Entity as Entity>::KIND;
        info!(%kind, id = ?saved.id(), %user_id, "child created");
        self.crud.publish_dto("created", &out).await;
        Ok(out)
    }

    async fn update(&self, id: EntityId, dto: M::Dto) -> Result<M::Dto, Error> {
        dto.validate(Intent::Update)?;
        let existing = self.crud.load(id, &FetchPlan::empty(<R::Entity as Entity>::KIND)).await?;
        let mapper = self.crud.mapper();

        let updated = match dto.user_id() {
            Some(target) if existing.user_id() != Some(target) => {
                let mut new_owner = self.load_owner(target).await?;
                let mut child = self.release(existing).await?;
                mapper.partial_update(&dto, &mut child);
                self.crud.context().stamp_modified(child.record_mut());
                child
                    .attach_to(&mut new_owner)
                    .map_err(|err| Error::from(super::MappingError::from(err)))?;
                info!(%id, user_id = %target, "child moved to another user");
                Self::linked(&new_owner, Some(id))?
            }
            _ => {
                let mut child = existing;
                mapper.partial_update(&dto, &mut child);
                self.crud.context().stamp_modified(child.record_mut());
                child
            }
        };

        let saved = self.crud.persist(updated).await?;
        let out = mapper.to_dto(&saved);
        self.crud.publish_dto("updated", &out).await;
        Ok(out)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), Error> {
        let existing = self.crud.load(id, &FetchPlan::empty(<R::Entity as Entity>::KIND)).await?;
        self.release(existing).await?;
        self.crud.remove(id).await?;
        let kind = <R::Entity as Entity>::KIND;
        info!(%kind, %id, "child deleted");
        self.crud.publish("deleted", json!({ "id": id })).await;
        Ok(())
    }
}

#[async_trait]
impl<R, U, M> OwnedResourceService<M::Dto> for OwnedEntityService<R, U, M>
where
    R: OwnedEntityRepository + 'static,
    R::Entity: OwnedByUser,
    U: EntityRepository<Entity = User> + 'static,
    M: EntityMapper<Entity = R::Entity>,
    M::Dto: OwnedPayload + serde::Serialize,
{
    async fn find_by_user_id(
        &self,
        user_id: EntityId,
        include_audit: bool,
    ) -> Result<Vec<M::Dto>, Error> {
        let kind = <R::Entity as Entity>::KIND;
        let children = self
            .crud
            .repository()
            .find_by_user_id(user_id, &FetchPlan::empty(kind))
            .await
            .map_err(map_repository_error)?;
        let options = AttributeSelection::basic(kind).mapping_options(include_audit);
        self.crud
            .mapper()
            .to_dto_list(&children, &options)
            .map_err(Error::from)
    }
}
